use anyhow::{bail, Context};
use browser_probe::{Config, Credentials};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("browser-probe")
        .about("Checks login, sign-up, search and title affordances of a web page")
        .arg(Arg::new("url").required(true).help("Page to open"))
        .arg(
            Arg::new("instruction")
                .required(true)
                .help("e.g. \"Run tests on search bar\""),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .value_name("FILE")
                .help("TOML site profile"),
        )
        .arg(
            Arg::new("headful")
                .long("headful")
                .action(ArgAction::SetTrue)
                .help("Show the browser window"),
        )
        .arg(
            Arg::new("expect-title")
                .long("expect-title")
                .value_name("TITLE"),
        )
        .arg(Arg::new("query").long("query").value_name("QUERY"))
        .arg(Arg::new("email").long("email").value_name("EMAIL"))
        .arg(
            Arg::new("password")
                .long("password")
                .value_name("PASSWORD")
                .requires("email")
                .conflicts_with("mobile"),
        )
        .arg(
            Arg::new("mobile")
                .long("mobile")
                .value_name("NUMBER")
                .requires("email"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the report as JSON"),
        )
}

fn credentials(matches: &ArgMatches) -> anyhow::Result<Option<Credentials>> {
    let Some(email) = matches.get_one::<String>("email") else {
        return Ok(None);
    };
    if let Some(password) = matches.get_one::<String>("password") {
        return Ok(Some(Credentials::with_password(email, password)));
    }
    if let Some(mobile) = matches.get_one::<String>("mobile") {
        return Ok(Some(Credentials::with_mobile_number(email, mobile)));
    }
    bail!("--email needs either --password or --mobile")
}

fn config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<String>("profile") {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading profile {}", path))?
        }
        None => Config::default(),
    };

    if matches.get_flag("headful") {
        config.browser.headless = false;
    }
    if let Some(title) = matches.get_one::<String>("expect-title") {
        config.site.expected_title = Some(title.clone());
    }
    if let Some(query) = matches.get_one::<String>("query") {
        config.site.search_query = query.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = cli().get_matches();
    let url = matches
        .get_one::<String>("url")
        .context("missing URL")?;
    let instruction = matches
        .get_one::<String>("instruction")
        .context("missing instruction")?;

    let config = config(&matches)?;
    let credentials = credentials(&matches)?;

    info!(site = %config.site.name, "starting");
    let report = browser_probe::run(config, url, instruction, credentials.as_ref()).await?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    std::process::exit(report.exit_code());
}
