use clap::{Args, Parser, Subcommand};
use pushgate::NotificationType;
use pushgate::config::{
    AligoConfig, AppConfig, DEFAULT_ALIGO_API_URL, DEFAULT_PUSH_TTL, DEFAULT_REQUEST_TIMEOUT,
};
use pushgate::notify::NotifyOutcome;
use pushgate::state::AppState;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use time::Duration;

/// Environment name that switches the SMS provider into test mode.
const SANDBOX_ENVIRONMENT: &str = "development";

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig, SocketAddr),
    Notify(AppConfig, NotifyRequest),
    Exit(i32),
}

pub(crate) struct NotifyRequest {
    user_id: String,
    kind: NotificationType,
    params: BTreeMap<String, String>,
}

pub(crate) fn run() -> RunOutcome {
    run_with(Cli::parse())
}

fn run_with(cli: Cli) -> RunOutcome {
    if let Some(Command::Init(args)) = &cli.command {
        return RunOutcome::Exit(run_init(args));
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    match cli.command {
        Some(Command::Notify(args)) => RunOutcome::Notify(
            config,
            NotifyRequest {
                user_id: args.user,
                kind: args.kind,
                params: args.params.into_iter().collect(),
            },
        ),
        _ => RunOutcome::Serve(config, cli.listen),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pushgate",
    version,
    about = "Web push and SMS notification delivery"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "PUSHGATE_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
    #[arg(long, env = "PUSHGATE_APP_NAME", default_value = "SafetyWallet")]
    app_name: String,
    /// TOML file with users, phone numbers, and push subscriptions.
    #[arg(long, env = "PUSHGATE_REGISTRY")]
    registry: Option<PathBuf>,
    #[arg(long, env = "PUSHGATE_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "PUSHGATE_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "PUSHGATE_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    /// Seconds a push service may hold an undelivered message.
    #[arg(long, env = "PUSHGATE_PUSH_TTL", default_value_t = DEFAULT_PUSH_TTL)]
    push_ttl: u32,
    #[arg(long, env = "PUSHGATE_REQUEST_TIMEOUT")]
    request_timeout: Option<String>,
    #[arg(long, env = "PUSHGATE_ALIGO_API_KEY")]
    aligo_api_key: Option<String>,
    #[arg(long, env = "PUSHGATE_ALIGO_USER_ID")]
    aligo_user_id: Option<String>,
    #[arg(long, env = "PUSHGATE_ALIGO_SENDER")]
    aligo_sender: Option<String>,
    #[arg(long, env = "PUSHGATE_KAKAO_SENDER_KEY")]
    kakao_sender_key: Option<String>,
    #[arg(long, env = "PUSHGATE_ALIGO_BASE_URL", default_value = DEFAULT_ALIGO_API_URL)]
    aligo_base_url: String,
    #[arg(long, env = "PUSHGATE_ENVIRONMENT", default_value = "production")]
    environment: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
    /// Deliver one notification and exit.
    Notify(NotifyArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

#[derive(Args, Debug)]
struct NotifyArgs {
    #[arg(long)]
    user: String,
    #[arg(long = "type")]
    kind: NotificationType,
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
}

fn run_init(args: &InitArgs) -> i32 {
    let keys = match pushgate::generate_vapid_keys() {
        Ok(keys) => keys,
        Err(err) => {
            eprintln!("failed to generate VAPID keys: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject.as_deref() {
        Some(subject) => (subject.to_string(), false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID keys generated.");
    println!();
    println!("PUSHGATE_VAPID_PRIVATE_KEY=\"{}\"", keys.private_key);
    println!("PUSHGATE_VAPID_PUBLIC_KEY=\"{}\"", keys.public_key);
    println!("PUSHGATE_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace PUSHGATE_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

pub(crate) async fn run_notify(config: AppConfig, request: NotifyRequest) -> i32 {
    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    match state
        .notifier
        .try_notify_user(&request.user_id, request.kind, &request.params)
        .await
    {
        Ok(NotifyOutcome::Pushed { delivered }) => {
            println!("delivered by push to {delivered} subscription(s)");
            0
        }
        Ok(NotifyOutcome::Sms) => {
            println!("delivered by SMS");
            0
        }
        Ok(NotifyOutcome::NoContact) => {
            eprintln!("not delivered: no reachable push subscription or phone number");
            1
        }
        Err(err) => {
            eprintln!("not delivered: {err}");
            1
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let request_timeout = match cli.request_timeout.as_deref() {
        Some(raw) => parse_request_timeout(raw)?.unsigned_abs(),
        None => DEFAULT_REQUEST_TIMEOUT,
    };
    if cli.push_ttl == 0 {
        return Err("push ttl must be greater than 0".to_string());
    }
    if cli.app_name.trim().is_empty() {
        return Err("app name cannot be empty".to_string());
    }

    Ok(AppConfig {
        app_name: cli.app_name.trim().to_string(),
        registry: cli.registry.clone(),
        vapid_private_key: non_empty(&cli.vapid_private_key),
        vapid_public_key: non_empty(&cli.vapid_public_key),
        vapid_subject: non_empty(&cli.vapid_subject),
        push_ttl: cli.push_ttl,
        request_timeout,
        aligo: AligoConfig {
            api_key: non_empty(&cli.aligo_api_key),
            user_id: non_empty(&cli.aligo_user_id),
            sender: non_empty(&cli.aligo_sender),
            kakao_sender_key: non_empty(&cli.kakao_sender_key),
            base_url: cli.aligo_base_url.trim().to_string(),
            test_mode: cli.environment.trim() == SANDBOX_ENVIRONMENT,
        },
    })
}

/// Blank environment variables count as unset.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_request_timeout(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("request timeout cannot be empty".to_string());
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid request timeout '{value}'; expected <number>[s|m|h]"))?;

    if amount <= 0 {
        return Err("request timeout must be greater than 0".to_string());
    }

    match unit {
        's' => Ok(Duration::seconds(amount)),
        'm' => Ok(Duration::minutes(amount)),
        'h' => Ok(Duration::hours(amount)),
        _ => Err(format!(
            "invalid request timeout '{value}'; expected <number>[s|m|h]"
        )),
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid param '{raw}'; expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid param '{raw}'; key cannot be empty"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pushgate").chain(args.iter().copied()))
            .expect("parse cli")
    }

    #[test]
    fn parse_request_timeout__should_parse_seconds_when_unit_missing() {
        // When
        let duration = parse_request_timeout("30").expect("parse timeout");

        // Then
        assert_eq!(duration, Duration::seconds(30));
    }

    #[test]
    fn parse_request_timeout__should_parse_units() {
        // When
        let duration = parse_request_timeout("2M").expect("parse timeout");

        // Then
        assert_eq!(duration, Duration::minutes(2));
    }

    #[test]
    fn parse_request_timeout__should_reject_invalid_values() {
        // Then
        assert!(parse_request_timeout("").is_err());
        assert!(parse_request_timeout("0").is_err());
        assert!(parse_request_timeout("abc").is_err());
        assert!(parse_request_timeout("3d").is_err());
    }

    #[test]
    fn parse_param__should_split_on_first_equals() {
        assert_eq!(
            parse_param("reason=a=b"),
            Ok(("reason".to_string(), "a=b".to_string()))
        );
        assert!(parse_param("reason").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn resolve_config__should_enable_test_mode_for_development() {
        // Given
        let cli = parse(&[
            "--environment",
            "development",
            "--aligo-api-key",
            "key",
            "--vapid-subject",
            "  ",
            "--request-timeout",
            "5",
        ]);

        // When
        let config = resolve_config(&cli).expect("config");

        // Then
        assert!(config.aligo.test_mode);
        assert_eq!(config.aligo.api_key.as_deref(), Some("key"));
        assert_eq!(config.aligo.base_url, DEFAULT_ALIGO_API_URL);
        assert_eq!(config.vapid_subject, None);
        assert_eq!(config.request_timeout, std::time::Duration::from_secs(5));
        assert_eq!(config.push_ttl, DEFAULT_PUSH_TTL);
    }

    #[test]
    fn run_with__should_build_notify_request() {
        // Given
        let cli = parse(&[
            "notify",
            "--user",
            "worker-17",
            "--type",
            "POST_APPROVED",
            "--param",
            "points=10",
            "--param",
            "postId=p-1",
        ]);

        // When
        let outcome = run_with(cli);

        // Then
        let RunOutcome::Notify(config, request) = outcome else {
            panic!("expected notify outcome");
        };
        assert_eq!(config.app_name, "SafetyWallet");
        assert!(!config.aligo.test_mode);
        assert_eq!(request.user_id, "worker-17");
        assert_eq!(request.kind, NotificationType::PostApproved);
        assert_eq!(request.params.get("points").map(String::as_str), Some("10"));
        assert_eq!(request.params.len(), 2);
    }

    #[test]
    fn run_with__should_reject_invalid_timeout() {
        // Given
        let cli = parse(&["--request-timeout", "soon"]);

        // When
        let outcome = run_with(cli);

        // Then
        assert!(matches!(outcome, RunOutcome::Exit(2)));
    }

    #[test]
    fn cli__should_reject_unknown_notification_type() {
        let result = Cli::try_parse_from(["pushgate", "notify", "--user", "u", "--type", "NOPE"]);
        assert!(result.is_err());
    }
}
