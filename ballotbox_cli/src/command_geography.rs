use crate::{check, print_json, print_ok, Context};

pub fn command_province(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("add", Some(matches)) => {
            let election = ctx.open("province add");
            let admin = ctx.admin("province add");
            let name = matches.value_of("NAME").unwrap_or_default();
            check("province add", election.add_province(&admin, name));
            print_ok();
        }
        ("remove", Some(matches)) => {
            let election = ctx.open("province remove");
            let admin = ctx.admin("province remove");
            let name = matches.value_of("NAME").unwrap_or_default();
            check("province remove", election.remove_province(&admin, name));
            print_ok();
        }
        ("list", Some(_)) => {
            let election = ctx.open("province list");
            print_json("province list", &election.list_provinces());
        }
        _ => {}
    }
}

pub fn command_constituency(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("add", Some(matches)) => {
            let election = ctx.open("constituency add");
            let admin = ctx.admin("constituency add");
            let (province, constituency) = seat(matches);
            check(
                "constituency add",
                election.add_constituency(&admin, province, constituency),
            );
            print_ok();
        }
        ("remove", Some(matches)) => {
            let election = ctx.open("constituency remove");
            let admin = ctx.admin("constituency remove");
            let (province, constituency) = seat(matches);
            check(
                "constituency remove",
                election.remove_constituency(&admin, province, constituency),
            );
            print_ok();
        }
        ("list", Some(matches)) => {
            let election = ctx.open("constituency list");
            let province = matches.value_of("PROVINCE").unwrap_or_default();
            let constituencies = check(
                "constituency list",
                election.list_constituencies(province),
            );
            print_json("constituency list", &constituencies);
        }
        _ => {}
    }
}

/// The PROVINCE and CONSTITUENCY positionals
pub fn seat<'a>(matches: &'a clap::ArgMatches) -> (&'a str, &'a str) {
    (
        matches.value_of("PROVINCE").unwrap_or_default(),
        matches.value_of("CONSTITUENCY").unwrap_or_default(),
    )
}
