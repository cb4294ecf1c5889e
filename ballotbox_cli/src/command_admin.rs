use crate::{arg, check, print_json, print_ok, Context};
use ballotbox::NationalId;

pub fn command_admin(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("add", Some(matches)) => {
            let election = ctx.open("admin add");
            let authority = ctx.authority("admin add", matches);
            let id: NationalId = arg("admin add", matches, "ID");
            let name = matches.value_of("NAME").unwrap_or_default();
            let password = matches.value_of("PASSWORD").unwrap_or_default();
            check(
                "admin add",
                election.add_admin(&authority, id, name, password),
            );
            print_ok();
        }
        ("remove", Some(matches)) => {
            let election = ctx.open("admin remove");
            let authority = ctx.authority("admin remove", matches);
            let id: NationalId = arg("admin remove", matches, "ID");
            check("admin remove", election.remove_admin(&authority, id));
            print_ok();
        }
        ("show", Some(matches)) => {
            let election = ctx.open("admin show");
            let id: NationalId = arg("admin show", matches, "ID");
            let admin = check("admin show", election.view_admin(id));
            print_json("admin show", &admin);
        }
        ("list", Some(_)) => {
            let election = ctx.open("admin list");
            print_json("admin list", &election.list_admins());
        }
        _ => {}
    }
}
