use crate::command_geography::seat;
use crate::{arg, check, exit_with, print_json, print_ok, Context};
use ballotbox::CandidateId;
use std::fmt::Display;
use std::str::FromStr;

pub fn command_tally(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("count", Some(matches)) => {
            let election = ctx.open("tally count");
            let (province, constituency) = seat(matches);
            let counts = check("tally count", election.tally_votes(province, constituency));
            print_json("tally count", &counts);
        }
        ("load", Some(matches)) => {
            let election = ctx.open("tally load");
            let admin = ctx.admin("tally load");
            let (province, constituency) = seat(matches);
            let counts = check(
                "tally load",
                election.load_vote_counts(&admin, province, constituency),
            );
            print_json("tally load", &counts);
        }
        ("enter", Some(matches)) => {
            let candidates: Vec<CandidateId> =
                split_list("tally enter", matches.value_of("candidates").unwrap_or_default());
            let counts: Vec<u64> =
                split_list("tally enter", matches.value_of("counts").unwrap_or_default());

            let election = ctx.open("tally enter");
            let admin = ctx.admin("tally enter");
            let seat = check(
                "tally enter",
                election.enter_vote_counts(&admin, &candidates, &counts),
            );
            print_json("tally enter", &seat);
        }
        ("declare", Some(matches)) => {
            let election = ctx.open("tally declare");
            let admin = ctx.admin("tally declare");
            let (province, constituency) = seat(matches);
            let declaration = check(
                "tally declare",
                election.declare_winner(&admin, province, constituency),
            );
            print_json("tally declare", &declaration);
        }
        ("results", Some(matches)) => {
            let election = ctx.open("tally results");
            let (province, constituency) = seat(matches);
            let results = check("tally results", election.get_results(province, constituency));
            print_json("tally results", &results);
        }
        ("winner", Some(matches)) => {
            let election = ctx.open("tally winner");
            let (province, constituency) = seat(matches);
            let winner = check("tally winner", election.get_winner(province, constituency));
            print_json("tally winner", &winner);
        }
        ("votes", Some(matches)) => {
            let election = ctx.open("tally votes");
            let id: CandidateId = arg("tally votes", matches, "CANDIDATE-ID");
            let votes = check("tally votes", election.get_candidate_votes(id));
            print_json("tally votes", &serde_json::json!({ "candidate_id": id, "votes": votes }));
        }
        ("declared", Some(_)) => {
            let election = ctx.open("tally declared");
            print_json("tally declared", &election.declared_results());
        }
        ("reset", Some(matches)) => {
            let election = ctx.open("tally reset");
            let admin = ctx.admin("tally reset");
            if !matches.is_present("voters") {
                check("tally reset", election.reset_all_results(&admin));
            }
            if !matches.is_present("results") {
                check("tally reset", election.reset_all_voters(&admin));
            }
            print_ok();
        }
        _ => {}
    }
}

/// Parse a comma separated list
fn split_list<T>(cmd: &str, list: &str) -> Vec<T>
where
    T: FromStr,
    T::Err: Display,
{
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .unwrap_or_else(|e| exit_with(cmd, format!("invalid list entry {:?}: {}", item, e)))
        })
        .collect()
}
