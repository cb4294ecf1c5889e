use crate::{arg, check, print_json, print_ok, Context};
use ballotbox::{CandidateId, NationalId};

pub fn command_voting(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("start", Some(matches)) => {
            let election = ctx.open("voting start");
            let admin = ctx.admin("voting start");
            let hours: u64 = arg("voting start", matches, "HOURS");
            let window = check("voting start", election.start_voting(&admin, hours));
            print_json("voting start", &window);
        }
        ("stop", Some(_)) => {
            let election = ctx.open("voting stop");
            let admin = ctx.admin("voting stop");
            check("voting stop", election.stop_voting(&admin));
            print_ok();
        }
        ("status", Some(_)) => {
            let election = ctx.open("voting status");
            print_json("voting status", &election.voting_status());
        }
        _ => {}
    }
}

pub fn command_vote(matches: &clap::ArgMatches, ctx: &Context) {
    match matches.subcommand() {
        ("key", Some(matches)) => {
            let election = ctx.open("vote key");
            let voter: NationalId = arg("vote key", matches, "NATIONAL-ID");
            let password = matches.value_of("PASSWORD").unwrap_or_default();
            let secret_key = matches.value_of("SECRET-KEY").unwrap_or_default();
            check(
                "vote key",
                election.register_secret_key(voter, password, secret_key),
            );
            print_ok();
        }
        ("cast", Some(matches)) => {
            let election = ctx.open("vote cast");
            let voter: NationalId = arg("vote cast", matches, "NATIONAL-ID");
            let password = matches.value_of("PASSWORD").unwrap_or_default();
            let candidate: CandidateId = arg("vote cast", matches, "CANDIDATE-ID");
            let secret_key = matches.value_of("SECRET-KEY").unwrap_or_default();
            check(
                "vote cast",
                election.cast_vote(voter, password, candidate, secret_key),
            );
            print_ok();
        }
        ("verify", Some(matches)) => {
            let election = ctx.open("vote verify");
            let voter: NationalId = arg("vote verify", matches, "NATIONAL-ID");
            let secret_key = matches.value_of("SECRET-KEY").unwrap_or_default();
            print_json("vote verify", &election.verify_my_vote(voter, secret_key));
        }
        _ => {}
    }
}
