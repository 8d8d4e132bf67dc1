use anyhow::{bail, Result};
use clap::Args;
use threadbot_core_types::{RunId, RunReport};

use crate::config::AppConfig;
use crate::runner::{BrowserLauncher, RunEnvironment, RunLauncher};

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Comment text (overrides comment.payload)
    #[arg(long)]
    pub comment: Option<String>,

    /// Profile handle, profile URL or post URL (overrides target)
    #[arg(long)]
    pub target: Option<String>,

    /// Run without a visible browser window
    #[arg(long)]
    pub headless: bool,
}

impl RunArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(comment) = &self.comment {
            config.comment.payload = comment.clone();
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
    }
}

pub async fn cmd_run(args: RunArgs, mut config: AppConfig, output: OutputFormat) -> Result<()> {
    args.apply(&mut config);
    let run = config.run_config()?;
    let flow = config.flow_config()?;

    let launcher = BrowserLauncher::new(
        config.browser_options(),
        RunEnvironment::from_config(&config, flow),
    );
    let report = launcher.launch(RunId::new(), run).await;
    print_report(&report, output)?;

    if !report.succeeded() {
        bail!("run ended in state {}", report.final_state);
    }
    Ok(())
}

fn print_report(report: &RunReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Human => {
            let states: Vec<String> = report
                .reached_states
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("Run {}", report.run_id);
            println!("  states:    {}", states.join(" -> "));
            println!("  logged in: {}", report.login_succeeded);
            println!("  submitted: {}", report.comment_submitted);
            if let Some(method) = report.submission {
                println!("  via:       {:?}", method);
            }
            for error in &report.errors {
                println!("  [{}] {}", error.category, error.message);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        config.comment.payload = "from file".into();
        let args = RunArgs {
            comment: Some("from flag".into()),
            target: Some("@other".into()),
            headless: true,
        };
        args.apply(&mut config);
        assert_eq!(config.comment.payload, "from flag");
        assert_eq!(config.target, "@other");
        assert!(config.browser.headless);
    }
}
