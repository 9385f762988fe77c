//! Interactive session shell
//!
//! Keeps one server session open and walks it through the same views the
//! browser app offers: log in, predict, read the description, log out.

use anyhow::Result;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::describe::stream_to_stdout;
use crate::client::{ApiClient, PredictRequest};
use crate::output::{
    color_status, print_error, print_info, print_prediction, print_success, OutputFormat,
};

const HELP: &str = "\
commands:
  login [user] [password]            log in and open the predictor view
  predict <co> <ozone> <no2> <pm25>  score one set of pollutant AQI readings
  describe                           open the description view
  home                               return to the predictor view
  view                               show the current view
  logout                             log out
  help                               show this message
  quit                               end the session and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Login {
        username: Option<String>,
        password: Option<String>,
    },
    Predict(PredictInput),
    Describe,
    Home,
    View,
    Logout,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictInput {
    pub co_aqi: f64,
    pub ozone_aqi: f64,
    pub no2_aqi: f64,
    pub pm25_aqi: f64,
}

impl From<PredictInput> for PredictRequest {
    fn from(input: PredictInput) -> Self {
        Self {
            co_aqi: input.co_aqi,
            ozone_aqi: input.ozone_aqi,
            no2_aqi: input.no2_aqi,
            pm25_aqi: input.pm25_aqi,
        }
    }
}

/// Parse one line of shell input
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(ShellCommand::Empty);
    };
    let args: Vec<&str> = parts.collect();

    match word.to_lowercase().as_str() {
        "login" => {
            if args.len() > 2 {
                return Err("usage: login [user] [password]".to_string());
            }
            Ok(ShellCommand::Login {
                username: args.first().map(|s| s.to_string()),
                password: args.get(1).map(|s| s.to_string()),
            })
        }
        "predict" => {
            if args.len() != 4 {
                return Err("usage: predict <co> <ozone> <no2> <pm25>".to_string());
            }
            let names = ["co", "ozone", "no2", "pm25"];
            let mut values = [0.0; 4];
            for (i, raw) in args.iter().enumerate() {
                values[i] = raw
                    .parse::<f64>()
                    .map_err(|_| format!("{} must be a number, got '{}'", names[i], raw))?;
            }
            Ok(ShellCommand::Predict(PredictInput {
                co_aqi: values[0],
                ozone_aqi: values[1],
                no2_aqi: values[2],
                pm25_aqi: values[3],
            }))
        }
        "describe" | "description" => Ok(ShellCommand::Describe),
        "home" => Ok(ShellCommand::Home),
        "view" | "status" => Ok(ShellCommand::View),
        "logout" => Ok(ShellCommand::Logout),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

/// Run the interactive shell until `quit` or end of input
pub async fn run_shell(
    client: &ApiClient,
    default_user: &str,
    default_password: &str,
    format: OutputFormat,
) -> Result<()> {
    let session = client.create_session().await?;
    let id = session.session_id;
    print_info(&format!("Session {} opened, type 'help' for commands", id));

    // The session is ended even when the input loop fails
    let outcome = read_commands(client, &id, default_user, default_password, format).await;
    let ended = client.end_session(&id).await;
    outcome?;
    ended?;
    print_info("Session closed");
    Ok(())
}

async fn read_commands(
    client: &ApiClient,
    id: &str,
    default_user: &str,
    default_password: &str,
    format: OutputFormat,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "aqi>".cyan().bold());
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(command) => command,
            Err(message) => {
                print_error(&message);
                continue;
            }
        };

        // Server refusals are shown and the shell carries on
        if let Err(e) = run_command(client, id, command, default_user, default_password, format).await
        {
            print_error(&e.to_string());
        }
    }

    Ok(())
}

async fn run_command(
    client: &ApiClient,
    id: &str,
    command: ShellCommand,
    default_user: &str,
    default_password: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ShellCommand::Login { username, password } => {
            let username = username.unwrap_or_else(|| default_user.to_string());
            let password = password.unwrap_or_else(|| default_password.to_string());
            let info = client.login(id, &username, &password).await?;
            print_success(&format!("Logged in, now at {}", color_status(&info.view)));
        }
        ShellCommand::Predict(input) => {
            let info = client.get_session(id).await?;
            if info.view != "predict_aqi" {
                client.navigate(id, "predict_aqi").await?;
            }
            let prediction = client.predict(id, &input.into()).await?;
            print_prediction(&prediction, format);
        }
        ShellCommand::Describe => stream_to_stdout(client, id).await?,
        ShellCommand::Home => {
            let info = client.navigate(id, "predict_aqi").await?;
            print_info(&format!("Now at {}", color_status(&info.view)));
        }
        ShellCommand::View => {
            let info = client.get_session(id).await?;
            match info.user {
                Some(user) => println!("{} ({})", color_status(&info.view), user),
                None => println!("{}", color_status(&info.view)),
            }
        }
        ShellCommand::Logout => {
            client.logout(id).await?;
            print_success("Logged out");
        }
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit | ShellCommand::Empty => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let command = parse_command("predict 10 20 15.5 30").unwrap();
        assert_eq!(
            command,
            ShellCommand::Predict(PredictInput {
                co_aqi: 10.0,
                ozone_aqi: 20.0,
                no2_aqi: 15.5,
                pm25_aqi: 30.0,
            })
        );
    }

    #[test]
    fn test_parse_predict_names_bad_field() {
        let err = parse_command("predict 10 abc 15 30").unwrap_err();
        assert!(err.contains("ozone"));

        let err = parse_command("predict 10 20").unwrap_err();
        assert!(err.starts_with("usage"));
    }

    #[test]
    fn test_parse_login_variants() {
        assert_eq!(
            parse_command("login").unwrap(),
            ShellCommand::Login {
                username: None,
                password: None
            }
        );
        assert_eq!(
            parse_command("LOGIN alice secret").unwrap(),
            ShellCommand::Login {
                username: Some("alice".into()),
                password: Some("secret".into())
            }
        );
        assert!(parse_command("login a b c").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("   ").unwrap(), ShellCommand::Empty);
        assert_eq!(parse_command("describe").unwrap(), ShellCommand::Describe);
        assert_eq!(parse_command("exit").unwrap(), ShellCommand::Quit);
        assert_eq!(parse_command("?").unwrap(), ShellCommand::Help);
        assert!(parse_command("dance").unwrap_err().contains("dance"));
    }
}
