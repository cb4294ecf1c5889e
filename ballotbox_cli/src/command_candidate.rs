use crate::command_geography::seat;
use crate::{arg, check, print_json, print_ok, Context};
use ballotbox::{CandidateId, NationalId};

pub fn command_candidate(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("register", Some(matches)) => {
            let election = ctx.open("candidate register");
            let admin = ctx.admin("candidate register");
            let national_id: NationalId = arg("candidate register", matches, "NATIONAL-ID");
            let name = matches.value_of("NAME").unwrap_or_default();
            let (province, constituency) = seat(matches);
            let party = matches.value_of("PARTY").unwrap_or_default();

            let id = check(
                "candidate register",
                election.register_candidate(&admin, national_id, name, province, constituency, party),
            );
            print_json("candidate register", &serde_json::json!({ "candidate_id": id }));
        }
        ("remove", Some(matches)) => {
            let election = ctx.open("candidate remove");
            let admin = ctx.admin("candidate remove");
            let id: CandidateId = arg("candidate remove", matches, "CANDIDATE-ID");
            check("candidate remove", election.remove_candidate(&admin, id));
            print_ok();
        }
        ("show", Some(matches)) => {
            let election = ctx.open("candidate show");
            let id: CandidateId = arg("candidate show", matches, "CANDIDATE-ID");
            let candidate = if matches.is_present("history") {
                election.candidate_history(id)
            } else {
                election.view_candidate(id)
            };
            print_json("candidate show", &check("candidate show", candidate));
        }
        ("list", Some(matches)) => {
            let election = ctx.open("candidate list");
            let candidates = if matches.is_present("PROVINCE") {
                let (province, constituency) = seat(matches);
                election.candidates_by_constituency(province, constituency)
            } else {
                election.list_candidates()
            };
            print_json("candidate list", &candidates);
        }
        _ => {}
    }
}
