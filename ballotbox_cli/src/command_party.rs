use crate::{check, print_json, print_ok, Context};

pub fn command_party(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("add", Some(matches)) => {
            let election = ctx.open("party add");
            let admin = ctx.admin("party add");
            let name = matches.value_of("NAME").unwrap_or_default();
            check("party add", election.add_party(&admin, name));
            print_ok();
        }
        ("remove", Some(matches)) => {
            let election = ctx.open("party remove");
            let admin = ctx.admin("party remove");
            let name = matches.value_of("NAME").unwrap_or_default();
            check("party remove", election.remove_party(&admin, name));
            print_ok();
        }
        ("list", Some(_)) => {
            let election = ctx.open("party list");
            print_json("party list", &election.list_parties());
        }
        _ => {}
    }
}
