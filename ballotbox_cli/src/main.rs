use ballotbox::{Authority, Credentials, Election, FileStore, NationalId, SystemClock};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use num_enum::TryFromPrimitive;
use serde::Serialize;
use std::convert::TryFrom;
use std::fmt::Display;
use std::str::FromStr;

mod command_admin;
mod command_candidate;
mod command_geography;
mod command_party;
mod command_report;
mod command_tally;
mod command_voter;
mod command_voting;
mod config;
mod logging;

use config::Config;

#[derive(TryFromPrimitive, PartialEq, Copy, Clone, Debug)]
#[repr(u8)]
pub enum Verbosity {
    Silent = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Verbosity {
    fn level(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Resolved settings shared by every command
pub struct Context {
    pub db_path: String,
    pub owner_secret: Option<String>,
    pub admin_id: Option<String>,
    pub admin_password: Option<String>,
    pub verbosity: Verbosity,
}

fn main() {
    let matches = app().get_matches();
    let config = Config::from_env();

    let verbosity = if matches.is_present("quiet") {
        Verbosity::Silent
    } else {
        let level = 2 + matches.occurrences_of("v").min(2) as u8;
        Verbosity::try_from(level).unwrap_or(Verbosity::Debug)
    };
    let log_format = match matches.value_of("log-format") {
        Some("json") => logging::LogFormat::Json,
        Some(_) => logging::LogFormat::Human,
        None => config.log_format,
    };
    logging::init_logging(log_format, verbosity.level());

    let db_path = match matches.value_of("db") {
        Some(path) => expand(path),
        None => expand(&config.db_path),
    };
    let ctx = Context {
        db_path,
        owner_secret: matches
            .value_of("owner-secret")
            .map(str::to_owned)
            .or(config.owner_secret),
        admin_id: matches
            .value_of("admin-id")
            .map(str::to_owned)
            .or(config.admin_id),
        admin_password: matches
            .value_of("admin-password")
            .map(str::to_owned)
            .or(config.admin_password),
        verbosity,
    };
    if ctx.verbosity as u8 >= 3 {
        eprintln!("ledger: {}", ctx.db_path);
    }

    // Subcommands
    match matches.subcommand() {
        ("init", Some(_)) => command_init(&ctx),
        ("admin", Some(matches)) => command_admin::command_admin(matches, &ctx),
        ("province", Some(matches)) => command_geography::command_province(matches, &ctx),
        ("constituency", Some(matches)) => {
            command_geography::command_constituency(matches, &ctx)
        }
        ("party", Some(matches)) => command_party::command_party(matches, &ctx),
        ("candidate", Some(matches)) => command_candidate::command_candidate(matches, &ctx),
        ("voter", Some(matches)) => command_voter::command_voter(matches, &ctx),
        ("voting", Some(matches)) => command_voting::command_voting(matches, &ctx),
        ("vote", Some(matches)) => command_voting::command_vote(matches, &ctx),
        ("tally", Some(matches)) => command_tally::command_tally(matches, &ctx),
        ("stats", Some(_)) => command_report::command_stats(&ctx),
        ("lookup", Some(matches)) => command_report::command_lookup(matches, &ctx),
        ("journal", Some(matches)) => command_report::command_journal(matches, &ctx),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(1);
        }
    }
}

fn command_init(ctx: &Context) {
    let secret = ctx.owner_secret("init");
    let store = FileStore::new(&ctx.db_path);
    check("init", Election::create(store, SystemClock, secret));
    print_json("init", &serde_json::json!({ "created": ctx.db_path }));
}

impl Context {
    /// Open the ledger at the configured path, or exit
    pub fn open(&self, cmd: &str) -> Election<FileStore> {
        check(
            cmd,
            Election::open(FileStore::new(&self.db_path), SystemClock),
        )
    }

    pub fn owner_secret(&self, cmd: &str) -> &str {
        self.owner_secret.as_deref().unwrap_or_else(|| {
            exit_with(
                cmd,
                "owner secret required: pass --owner-secret or set BALLOTBOX_OWNER_SECRET",
            )
        })
    }

    pub fn admin(&self, cmd: &str) -> Credentials {
        let id = self.admin_id.as_deref().unwrap_or_else(|| {
            exit_with(
                cmd,
                "admin id required: pass --admin-id or set BALLOTBOX_ADMIN_ID",
            )
        });
        let password = self.admin_password.as_deref().unwrap_or_else(|| {
            exit_with(
                cmd,
                "admin password required: pass --admin-password or set BALLOTBOX_ADMIN_PASSWORD",
            )
        });
        let id: NationalId = check(cmd, id.parse());
        Credentials::new(id, password)
    }

    /// The owner when `--as-owner` was given, otherwise the admin
    pub fn authority(&self, cmd: &str, matches: &ArgMatches) -> Authority {
        if matches.is_present("as-owner") {
            Authority::Owner {
                secret: self.owner_secret(cmd).to_owned(),
            }
        } else {
            Authority::Admin(self.admin(cmd))
        }
    }
}

pub fn expand(input: &str) -> String {
    shellexpand::full(input)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| input.to_owned())
}

pub fn exit_with(cmd: &str, message: impl Display) -> ! {
    eprintln!("ballotbox {}: {}", cmd, message);
    std::process::exit(1);
}

pub fn check<T, E: Display>(cmd: &str, result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| exit_with(cmd, e))
}

/// Parse a positional argument, or exit
pub fn arg<T>(cmd: &str, matches: &ArgMatches, name: &str) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let value = matches.value_of(name).unwrap_or_default();
    check(
        cmd,
        value
            .parse::<T>()
            .map_err(|e| format!("invalid {}: {}", name, e)),
    )
}

pub fn print_json<T: Serialize>(cmd: &str, value: &T) {
    println!("{}", check(cmd, serde_json::to_string_pretty(value)));
}

pub fn print_ok() {
    println!("{}", serde_json::json!({ "ok": true }));
}

fn positional(name: &'static str, index: u64, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name).index(index).required(true).help(help)
}

fn as_owner() -> Arg<'static, 'static> {
    Arg::with_name("as-owner")
        .long("as-owner")
        .help("Act as the system owner instead of an admin")
}

fn seat_args<'a, 'b>(cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.arg(positional("PROVINCE", 1, "Province name"))
        .arg(positional("CONSTITUENCY", 2, "Constituency name"))
}

fn group(name: &'static str, about: &'static str) -> App<'static, 'static> {
    SubCommand::with_name(name)
        .about(about)
        .setting(AppSettings::SubcommandRequiredElseHelp)
}

fn app() -> App<'static, 'static> {
    App::new("ballotbox")
        .version("0.1.0")
        .about("Runs a multi-constituency election against a ledger file")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("db")
                .long("db")
                .takes_value(true)
                .help("Ledger file - can also be set with BALLOTBOX_DB_PATH"),
        )
        .arg(
            Arg::with_name("admin-id")
                .long("admin-id")
                .takes_value(true)
                .help("Acting admin's national id - can also be set with BALLOTBOX_ADMIN_ID"),
        )
        .arg(
            Arg::with_name("admin-password")
                .long("admin-password")
                .takes_value(true)
                .help("Acting admin's password - can also be set with BALLOTBOX_ADMIN_PASSWORD"),
        )
        .arg(
            Arg::with_name("owner-secret")
                .long("owner-secret")
                .takes_value(true)
                .help("System owner secret - can also be set with BALLOTBOX_OWNER_SECRET"),
        )
        .arg(
            Arg::with_name("log-format")
                .long("log-format")
                .takes_value(true)
                .possible_values(&["human", "json"])
                .help("Log format - can also be set with BALLOTBOX_LOG_FORMAT"),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Silence all logging"),
        )
        .subcommand(SubCommand::with_name("init").about("Create a new ledger owned by the owner secret"))
        .subcommand(
            group("admin", "Manage administrators")
                .subcommand(
                    SubCommand::with_name("add")
                        .about("Add an admin")
                        .arg(positional("ID", 1, "National id"))
                        .arg(positional("NAME", 2, "Full name"))
                        .arg(positional("PASSWORD", 3, "Password"))
                        .arg(as_owner()),
                )
                .subcommand(
                    SubCommand::with_name("remove")
                        .about("Remove an admin")
                        .arg(positional("ID", 1, "National id"))
                        .arg(as_owner()),
                )
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show an admin record")
                        .arg(positional("ID", 1, "National id")),
                )
                .subcommand(SubCommand::with_name("list").about("List active admins")),
        )
        .subcommand(
            group("province", "Manage provinces")
                .subcommand(
                    SubCommand::with_name("add")
                        .about("Add a province")
                        .arg(positional("NAME", 1, "Province name")),
                )
                .subcommand(
                    SubCommand::with_name("remove")
                        .about("Remove a province with no constituencies")
                        .arg(positional("NAME", 1, "Province name")),
                )
                .subcommand(SubCommand::with_name("list").about("List provinces")),
        )
        .subcommand(
            group("constituency", "Manage constituencies")
                .subcommand(seat_args(
                    SubCommand::with_name("add").about("Add a constituency"),
                ))
                .subcommand(seat_args(
                    SubCommand::with_name("remove").about("Remove a constituency"),
                ))
                .subcommand(
                    SubCommand::with_name("list")
                        .about("List the constituencies of a province")
                        .arg(positional("PROVINCE", 1, "Province name")),
                ),
        )
        .subcommand(
            group("party", "Manage parties")
                .subcommand(
                    SubCommand::with_name("add")
                        .about("Add a party")
                        .arg(positional("NAME", 1, "Party name")),
                )
                .subcommand(
                    SubCommand::with_name("remove")
                        .about("Remove a party")
                        .arg(positional("NAME", 1, "Party name")),
                )
                .subcommand(SubCommand::with_name("list").about("List parties")),
        )
        .subcommand(
            group("candidate", "Manage candidates")
                .subcommand(
                    SubCommand::with_name("register")
                        .about("Register a candidate")
                        .arg(positional("NATIONAL-ID", 1, "National id"))
                        .arg(positional("NAME", 2, "Full name"))
                        .arg(positional("PROVINCE", 3, "Province name"))
                        .arg(positional("CONSTITUENCY", 4, "Constituency name"))
                        .arg(positional("PARTY", 5, "Party name")),
                )
                .subcommand(
                    SubCommand::with_name("remove")
                        .about("Remove a candidate")
                        .arg(positional("CANDIDATE-ID", 1, "Candidate id")),
                )
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show a candidate")
                        .arg(positional("CANDIDATE-ID", 1, "Candidate id"))
                        .arg(
                            Arg::with_name("history")
                                .long("history")
                                .help("Include removed candidates"),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("list")
                        .about("List candidates, optionally of one constituency")
                        .arg(Arg::with_name("PROVINCE").index(1).requires("CONSTITUENCY"))
                        .arg(Arg::with_name("CONSTITUENCY").index(2)),
                ),
        )
        .subcommand(
            group("voter", "Manage voters")
                .subcommand(
                    SubCommand::with_name("register")
                        .about("Register a voter")
                        .arg(positional("NATIONAL-ID", 1, "National id"))
                        .arg(positional("NAME", 2, "Full name"))
                        .arg(positional("PROVINCE", 3, "Province name"))
                        .arg(positional("CONSTITUENCY", 4, "Constituency name"))
                        .arg(positional("PASSWORD", 5, "Password")),
                )
                .subcommand(
                    SubCommand::with_name("batch")
                        .about("Register every voter in a file, or none of them")
                        .arg(positional("INPUT", 1, "List of registrations in JSON or CBOR format")),
                )
                .subcommand(
                    SubCommand::with_name("remove")
                        .about("Remove a voter")
                        .arg(positional("NATIONAL-ID", 1, "National id")),
                )
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show a voter")
                        .arg(positional("NATIONAL-ID", 1, "National id")),
                )
                .subcommand(
                    SubCommand::with_name("list")
                        .about("List voters, optionally of one constituency")
                        .arg(Arg::with_name("PROVINCE").index(1).requires("CONSTITUENCY"))
                        .arg(Arg::with_name("CONSTITUENCY").index(2)),
                )
                .subcommand(
                    SubCommand::with_name("passwd")
                        .about("Change a voter's password")
                        .arg(positional("NATIONAL-ID", 1, "National id"))
                        .arg(positional("OLD-PASSWORD", 2, "Current password"))
                        .arg(positional("NEW-PASSWORD", 3, "New password")),
                )
                .subcommand(
                    SubCommand::with_name("mark-voted")
                        .about("Set a voter's has-voted flag")
                        .arg(positional("NATIONAL-ID", 1, "National id")),
                ),
        )
        .subcommand(
            group("voting", "Control the voting window")
                .subcommand(
                    SubCommand::with_name("start")
                        .about("Reset the previous cycle and open voting")
                        .arg(positional("HOURS", 1, "Duration in hours (1-168)")),
                )
                .subcommand(SubCommand::with_name("stop").about("Close voting"))
                .subcommand(SubCommand::with_name("status").about("Show the voting window")),
        )
        .subcommand(
            group("vote", "Vote as a voter")
                .subcommand(
                    SubCommand::with_name("key")
                        .about("Register a secret key for this cycle")
                        .arg(positional("NATIONAL-ID", 1, "National id"))
                        .arg(positional("PASSWORD", 2, "Voter password"))
                        .arg(positional("SECRET-KEY", 3, "Secret key")),
                )
                .subcommand(
                    SubCommand::with_name("cast")
                        .about("Cast a vote")
                        .arg(positional("NATIONAL-ID", 1, "National id"))
                        .arg(positional("PASSWORD", 2, "Voter password"))
                        .arg(positional("CANDIDATE-ID", 3, "Candidate id"))
                        .arg(positional("SECRET-KEY", 4, "Secret key")),
                )
                .subcommand(
                    SubCommand::with_name("verify")
                        .about("Read back a cast vote")
                        .arg(positional("NATIONAL-ID", 1, "National id"))
                        .arg(positional("SECRET-KEY", 2, "Secret key")),
                ),
        )
        .subcommand(
            group("tally", "Count votes and declare results")
                .subcommand(seat_args(
                    SubCommand::with_name("count").about("Count cast ballots without storing them"),
                ))
                .subcommand(seat_args(
                    SubCommand::with_name("load")
                        .about("Count cast ballots and store them as the working counts"),
                ))
                .subcommand(
                    SubCommand::with_name("enter")
                        .about("Enter working counts by hand")
                        .arg(
                            Arg::with_name("candidates")
                                .long("candidates")
                                .takes_value(true)
                                .required(true)
                                .help("Comma separated candidate ids"),
                        )
                        .arg(
                            Arg::with_name("counts")
                                .long("counts")
                                .takes_value(true)
                                .required(true)
                                .help("Comma separated vote counts, one per candidate"),
                        ),
                )
                .subcommand(seat_args(
                    SubCommand::with_name("declare").about("Declare the winner"),
                ))
                .subcommand(seat_args(
                    SubCommand::with_name("results").about("Show working counts"),
                ))
                .subcommand(seat_args(
                    SubCommand::with_name("winner").about("Show the declared winner"),
                ))
                .subcommand(
                    SubCommand::with_name("votes")
                        .about("Show one candidate's working count")
                        .arg(positional("CANDIDATE-ID", 1, "Candidate id")),
                )
                .subcommand(SubCommand::with_name("declared").about("Show every declared result"))
                .subcommand(
                    SubCommand::with_name("reset")
                        .about("Clear results and voting state")
                        .arg(Arg::with_name("results").long("results").help("Only clear results"))
                        .arg(
                            Arg::with_name("voters")
                                .long("voters")
                                .conflicts_with("results")
                                .help("Only clear voting state"),
                        ),
                ),
        )
        .subcommand(SubCommand::with_name("stats").about("Show registry sizes and turnout"))
        .subcommand(
            SubCommand::with_name("lookup")
                .about("Show the roles a national id holds")
                .arg(positional("NATIONAL-ID", 1, "National id")),
        )
        .subcommand(
            SubCommand::with_name("journal")
                .about("Show the audit trail")
                .arg(
                    Arg::with_name("since")
                        .long("since")
                        .takes_value(true)
                        .default_value("0")
                        .help("Only entries after this sequence number"),
                ),
        )
}
