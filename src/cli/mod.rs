use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;

use crate::{
    config::{LlmProvider, SessionConfig, StorageClass},
    core::AgentSession,
    credentials::Credentials,
    hooks::CliExecutionHooks,
    logging::init_logging,
    tools::BrowserInfrastructure,
    trip::TripRequest,
    web::{self, AppState},
    workflow::{self, WorkflowState},
};

fn build_cli() -> Command {
    let example = TripRequest::example();

    Command::new("travel-agenta")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compose a travel task from trip details and hand it to a planning agent")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("provider")
                .long("provider")
                .value_name("PROVIDER")
                .global(true)
                .help("Model provider: google, openai or openrouter (or set AGENTA_LLM_PROVIDER)"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .global(true)
                .help("Model name (or set AGENTA_MODEL)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .global(true)
                .help("Chat-completions base URL (or set AGENTA_BASE_URL)"),
        )
        .arg(
            Arg::new("storage")
                .long("storage")
                .value_name("CLASS")
                .global(true)
                .help("Where plans and runs are kept: memory or disk (or set AGENTA_STORAGE_CLASS)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .global(true)
                .help("Request timeout in seconds (or set AGENTA_TIMEOUT_SECS)"),
        )
        .arg(
            Arg::new("max-iterations")
                .short('i')
                .long("max-iterations")
                .value_name("COUNT")
                .global(true)
                .help("Maximum model turns per phase step (or set AGENTA_MAX_ITERATIONS)"),
        )
        .arg(
            Arg::new("browser")
                .long("browser")
                .value_name("INFRA")
                .global(true)
                .help("How pages are opened: remote or local (or set AGENTA_BROWSER)"),
        )
        .arg(
            Arg::new("browser-url")
                .long("browser-url")
                .value_name("URL")
                .global(true)
                .help("Reader service for remote browsing (or set AGENTA_BROWSER_URL)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .global(true)
                .help("JSON audit log file, or `none` to disable (or set AGENTA_LOG_SINK)"),
        )
        .subcommand(
            Command::new("serve").about("Serve the web form").arg(
                Arg::new("bind")
                    .short('b')
                    .long("bind")
                    .value_name("ADDR")
                    .default_value("127.0.0.1:8501")
                    .help("Address to listen on"),
            ),
        )
        .subcommand(
            Command::new("plan")
                .about("Plan and run a trip from the command line")
                .arg(trip_arg("origin", "FROM", example.origin))
                .arg(trip_arg("destination", "TO", example.destination))
                .arg(trip_arg("start-date", "START DATE", example.start_date))
                .arg(trip_arg("return-date", "RETURN DATE", example.return_date))
                .arg(trip_arg("duration", "DURATION", example.duration))
                .arg(trip_arg("budget", "BUDGET", example.budget))
                .arg(trip_arg("trip-type", "TRIP TYPE (Solo, Family, Friends, Business)", example.trip_type.to_string()))
                .arg(trip_arg("accommodation", "ACCOMMODATION (Budget, Luxury, Flexible)", example.accommodation.to_string()))
                .arg(trip_arg("food", "FOOD PREFERENCES (Veg, Non Veg, Flexible)", example.food_preference.to_string()))
                .arg(trip_arg("activities", "ACTIVITIES", example.activities))
                .arg(trip_arg("emails", "Comma-separated recipient emails", example.emails))
                .arg(trip_arg("instructions", "CUSTOM INSTRUCTIONS", example.custom_instructions))
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .action(ArgAction::SetTrue)
                        .help("Print actions for the user but do not wait for confirmation"),
                ),
        )
}

fn trip_arg(name: &'static str, help: &'static str, default: String) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("TEXT")
        .help(help)
        .default_value(default)
}

fn string_arg(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn parsed_arg<T>(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .get_one::<String>(name)
        .map(|raw| raw.parse::<T>().with_context(|| format!("invalid --{name} `{raw}`")))
        .transpose()
}

fn session_config(matches: &ArgMatches) -> anyhow::Result<SessionConfig> {
    let mut config = SessionConfig::from_env()?;

    if let Some(provider) = parsed_arg::<LlmProvider>(matches, "provider")? {
        config = config.with_provider(provider);
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model);
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url);
    }
    if let Some(class) = parsed_arg::<StorageClass>(matches, "storage")? {
        let dir = config.storage_dir.clone();
        config = config.with_storage(class, dir);
    }
    if let Some(secs) = parsed_arg::<u64>(matches, "timeout")? {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(max) = parsed_arg::<usize>(matches, "max-iterations")? {
        config = config.with_max_iterations(max);
    }
    let infrastructure = parsed_arg::<BrowserInfrastructure>(matches, "browser")?;
    let browser_url = matches.get_one::<String>("browser-url");
    if infrastructure.is_some() || browser_url.is_some() {
        let infrastructure = infrastructure.unwrap_or(config.browser_infrastructure);
        let base_url = browser_url
            .cloned()
            .unwrap_or_else(|| config.browser_base_url.clone());
        config = config.with_browser(infrastructure, base_url);
    }
    if let Some(sink) = matches.get_one::<String>("log-file") {
        config = config.with_log_sink(match sink.as_str() {
            "none" | "-" => None,
            path => Some(PathBuf::from(path)),
        });
    }

    Ok(config)
}

fn trip_request(matches: &ArgMatches) -> anyhow::Result<TripRequest> {
    Ok(TripRequest {
        origin: string_arg(matches, "origin"),
        destination: string_arg(matches, "destination"),
        start_date: string_arg(matches, "start-date"),
        return_date: string_arg(matches, "return-date"),
        duration: string_arg(matches, "duration"),
        budget: string_arg(matches, "budget"),
        trip_type: parsed_arg(matches, "trip-type")?.unwrap_or_default(),
        accommodation: parsed_arg(matches, "accommodation")?.unwrap_or_default(),
        food_preference: parsed_arg(matches, "food")?.unwrap_or_default(),
        activities: string_arg(matches, "activities"),
        emails: string_arg(matches, "emails"),
        custom_instructions: string_arg(matches, "instructions"),
    })
}

/// CLI entry point
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let matches = build_cli().get_matches();
    let Some((command, sub)) = matches.subcommand() else {
        return Ok(());
    };
    let config = session_config(sub)?;
    init_logging(&config)?;

    match command {
        "serve" => {
            // Keys may also be entered in the browser.
            let credentials = Credentials::from_env().ok();
            let bind = string_arg(sub, "bind");
            web::serve(AppState::new(config, credentials), &bind).await
        }
        "plan" => plan_trip(&config, sub).await,
        other => anyhow::bail!("unknown command `{other}`"),
    }
}

async fn plan_trip(config: &SessionConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let request = trip_request(matches)?;
    let interactive = !matches.get_flag("non-interactive");
    info!(
        origin = %request.origin,
        destination = %request.destination,
        interactive,
        "Planning trip"
    );

    let report = workflow::submit(&request, || {
        let credentials = Credentials::from_env()?;
        AgentSession::configure(
            config,
            &credentials,
            Arc::new(CliExecutionHooks::new(interactive)),
        )
    })
    .await;

    if let Some(plan_text) = &report.plan_text {
        println!("\nPLAN STEPS\n{}", plan_text);
    }
    if let Some(summary) = &report.summary {
        println!("\nFINAL OUTPUT\n{}", summary);
    }
    if let Some(run) = &report.run {
        info!(
            plan_run_id = %run.id,
            state = ?run.state,
            actions = run.action_count(),
            "Plan run finished"
        );
        println!("\nRUN TRACE\n{}", run.replay());
    }

    match (report.state(), report.error) {
        (WorkflowState::Completed, _) => Ok(()),
        (_, Some(err)) => Err(anyhow::Error::new(err).context("An error occurred")),
        (state, None) => anyhow::bail!("workflow stopped in state {:?}", state),
    }
}
