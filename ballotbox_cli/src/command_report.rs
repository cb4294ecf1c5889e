use crate::{arg, check, print_json, Context};
use ballotbox::NationalId;

pub fn command_stats(ctx: &Context) {
    let election = ctx.open("stats");
    print_json("stats", &election.statistics());
}

pub fn command_lookup(matches: &clap::ArgMatches, ctx: &Context) {
    let election = ctx.open("lookup");
    let national_id: NationalId = arg("lookup", matches, "NATIONAL-ID");
    print_json("lookup", &election.lookup_national_id(national_id));
}

pub fn command_journal(matches: &clap::ArgMatches, ctx: &Context) {
    let election = ctx.open("journal");
    let since: u64 = check(
        "journal",
        matches
            .value_of("since")
            .unwrap_or("0")
            .parse::<u64>()
            .map_err(|e| format!("invalid since: {}", e)),
    );
    print_json("journal", &election.journal(since));
}
