use crate::command_geography::seat;
use crate::{arg, check, exit_with, expand, print_json, print_ok, Context};
use ballotbox::{NationalId, PasswordHash, VoterRegistration};
use content_inspector::ContentType;

pub fn command_voter(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("register", Some(matches)) => {
            let election = ctx.open("voter register");
            let admin = ctx.admin("voter register");
            let national_id: NationalId = arg("voter register", matches, "NATIONAL-ID");
            let name = matches.value_of("NAME").unwrap_or_default();
            let (province, constituency) = seat(matches);
            let password = matches.value_of("PASSWORD").unwrap_or_default();
            check(
                "voter register",
                election.register_voter(&admin, national_id, name, province, constituency, password),
            );
            print_ok();
        }
        ("batch", Some(matches)) => command_voter_batch(matches, ctx),
        ("remove", Some(matches)) => {
            let election = ctx.open("voter remove");
            let admin = ctx.admin("voter remove");
            let national_id: NationalId = arg("voter remove", matches, "NATIONAL-ID");
            check("voter remove", election.remove_voter(&admin, national_id));
            print_ok();
        }
        ("show", Some(matches)) => {
            let election = ctx.open("voter show");
            let national_id: NationalId = arg("voter show", matches, "NATIONAL-ID");
            print_json("voter show", &check("voter show", election.view_voter(national_id)));
        }
        ("list", Some(matches)) => {
            let election = ctx.open("voter list");
            let voters = if matches.is_present("PROVINCE") {
                let (province, constituency) = seat(matches);
                election.voters_by_constituency(province, constituency)
            } else {
                election.list_voters()
            };
            print_json("voter list", &voters);
        }
        ("passwd", Some(matches)) => {
            let election = ctx.open("voter passwd");
            let admin = ctx.admin("voter passwd");
            let national_id: NationalId = arg("voter passwd", matches, "NATIONAL-ID");
            let old = matches.value_of("OLD-PASSWORD").unwrap_or_default();
            let new = matches.value_of("NEW-PASSWORD").unwrap_or_default();
            check(
                "voter passwd",
                election.change_voter_password(
                    &admin,
                    national_id,
                    &PasswordHash::derive(national_id, old),
                    new,
                ),
            );
            print_ok();
        }
        ("mark-voted", Some(matches)) => {
            let election = ctx.open("voter mark-voted");
            let admin = ctx.admin("voter mark-voted");
            let national_id: NationalId = arg("voter mark-voted", matches, "NATIONAL-ID");
            check("voter mark-voted", election.mark_as_voted(&admin, national_id));
            print_ok();
        }
        _ => {}
    }
}

fn command_voter_batch(matches: &clap::ArgMatches, ctx: &Context) {
    let filename = expand(matches.value_of("INPUT").unwrap_or_default());
    let file_bytes = std::fs::read(&filename).unwrap_or_else(|e| {
        exit_with("voter batch", format!("unable to read {}: {}", filename, e))
    });

    let forms: Vec<VoterRegistration> =
        if file_bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[') {
            check("voter batch", serde_json::from_slice(&file_bytes))
        } else {
            match content_inspector::inspect(&file_bytes) {
                ContentType::BINARY | ContentType::UTF_8 => {
                    check("voter batch", serde_cbor::from_slice(&file_bytes))
                }
                _ => exit_with(
                    "voter batch",
                    format!("invalid file format for {}", filename),
                ),
            }
        };

    let election = ctx.open("voter batch");
    let admin = ctx.admin("voter batch");
    let registered = check("voter batch", election.batch_register_voters(&admin, &forms));
    print_json("voter batch", &serde_json::json!({ "registered": registered }));
}
