use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use super::{
    GoalResponse, InflationResponse, ProjectResponse, run_goal, run_inflation, run_projection,
};
use crate::core::{GoalOutcome, GoalParams, InfeasibleReason, InflationParams, ProjectionParams};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Compound-growth savings projections, goal solving and inflation adjustment"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project the balance of a growing monthly contribution schedule
    Project(ProjectArgs),
    /// Find the initial monthly contribution that reaches a savings goal
    Solve(SolveArgs),
    /// Convert an amount between nominal and real (today's) money
    Inflation(InflationArgs),
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Investment horizon: whole years, or the span between two ages.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct HorizonArgs {
    #[arg(long, help = "Investment horizon in whole years")]
    pub years: Option<u32>,
    #[arg(long)]
    pub current_age: Option<u32>,
    #[arg(long)]
    pub retirement_age: Option<u32>,
}

impl HorizonArgs {
    pub fn resolve(&self) -> Result<u32, String> {
        match (self.years, self.current_age, self.retirement_age) {
            (Some(0), None, None) => Err("--years must be > 0".to_string()),
            (Some(years), None, None) => Ok(years),
            (None, Some(current), Some(retirement)) => {
                if retirement <= current {
                    Err("--retirement-age must be > --current-age".to_string())
                } else {
                    Ok(retirement - current)
                }
            }
            (None, None, None) => Err(
                "an investment horizon is required: --years or --current-age with --retirement-age"
                    .to_string(),
            ),
            _ => Err("use either --years or --current-age with --retirement-age".to_string()),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 0.0)]
    pub initial_capital: f64,
    #[arg(long, help = "Monthly contribution in the first year")]
    pub monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual increase of the monthly contribution in percent"
    )]
    pub contribution_growth: f64,
    #[arg(long, help = "Expected annual return in percent, e.g. 9")]
    pub return_rate: f64,
    #[command(flatten)]
    pub horizon: HorizonArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SolveArgs {
    #[arg(long, default_value_t = 0.0)]
    pub initial_capital: f64,
    #[arg(long, help = "Savings goal at the end of the horizon")]
    pub target: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual increase of the monthly contribution in percent"
    )]
    pub contribution_growth: f64,
    #[arg(long, help = "Expected annual return in percent, e.g. 9")]
    pub return_rate: f64,
    #[command(flatten)]
    pub horizon: HorizonArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct InflationArgs {
    #[arg(long)]
    pub amount: f64,
    #[arg(long, help = "Annual inflation rate in percent")]
    pub rate: f64,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Years between the amount's date and today; negative values project forward"
    )]
    pub years: Option<f64>,
    #[arg(long, help = "Year whose money the result is expressed in")]
    pub base_year: Option<i32>,
    #[arg(long, help = "Year the amount is quoted in")]
    pub target_year: Option<i32>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn build_projection(args: &ProjectArgs) -> Result<ProjectionParams, String> {
    let years = args.horizon.resolve()?;
    ProjectionParams::new(
        args.initial_capital,
        args.monthly_contribution,
        args.contribution_growth / 100.0,
        args.return_rate / 100.0,
        years,
    )
    .map_err(|e| e.to_string())
}

pub fn build_goal(args: &SolveArgs) -> Result<GoalParams, String> {
    let years = args.horizon.resolve()?;
    GoalParams::new(
        args.initial_capital,
        args.target,
        args.contribution_growth / 100.0,
        args.return_rate / 100.0,
        years,
    )
    .map_err(|e| e.to_string())
}

pub fn build_inflation(args: &InflationArgs) -> Result<InflationParams, String> {
    let rate = args.rate / 100.0;
    let params = match (args.years, args.base_year, args.target_year) {
        (Some(years), None, None) => InflationParams::new(args.amount, rate, years),
        (None, Some(base), Some(target)) => {
            InflationParams::between_years(args.amount, rate, base, target)
        }
        (None, None, None) => {
            return Err("--years or --base-year with --target-year is required".to_string());
        }
        _ => return Err("use either --years or --base-year with --target-year".to_string()),
    };
    params.map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub body: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(body: String) -> Self {
        Self { body, exit_code: 0 }
    }
}

pub fn render_command(command: &Command) -> Result<CommandOutput, String> {
    match command {
        Command::Project(args) => {
            let response = run_projection(&build_projection(args)?)?;
            render_projection(&response, args.format).map(CommandOutput::ok)
        }
        Command::Solve(args) => {
            let response = run_goal(&build_goal(args)?)?;
            let body = render_goal(&response, args.format)?;
            let exit_code = if response.result.is_feasible() { 0 } else { 1 };
            Ok(CommandOutput { body, exit_code })
        }
        Command::Inflation(args) => {
            let response = run_inflation(&build_inflation(args)?)?;
            render_inflation(&response, args.format).map(CommandOutput::ok)
        }
        Command::Serve { .. } => Err("serve does not render output".to_string()),
    }
}

fn render_projection(response: &ProjectResponse, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(response),
        OutputFormat::Csv => {
            #[derive(Serialize)]
            struct Row {
                month: usize,
                value: f64,
            }
            to_csv(
                response
                    .result
                    .series
                    .iter()
                    .enumerate()
                    .map(|(idx, &value)| Row {
                        month: idx + 1,
                        value,
                    }),
            )
        }
        OutputFormat::Text => {
            let result = &response.result;
            let mut out = format!(
                "Projection over {} years ({} months)\n\
                 Terminal value:    {:.2}\n\
                 Total contributed: {:.2}\n\
                 Investment growth: {:.2}\n",
                response.years,
                result.series.len(),
                result.terminal_value,
                result.total_contributed,
                result.terminal_value - response.initial_capital - result.total_contributed,
            );
            out.push_str("\nYear  Balance\n");
            for (idx, value) in response.yearly_values.iter().enumerate() {
                out.push_str(&format!("{:>4}  {value:.2}\n", idx + 1));
            }
            Ok(out)
        }
    }
}

fn render_goal(response: &GoalResponse, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(response),
        OutputFormat::Csv => {
            #[derive(Serialize)]
            struct Row {
                status: &'static str,
                monthly_contribution: Option<f64>,
                terminal_value: Option<f64>,
                search_max: f64,
                iterations: usize,
            }
            let result = &response.result;
            let (status, terminal_value) = match result.outcome {
                GoalOutcome::Found { terminal_value, .. } => ("found", Some(terminal_value)),
                GoalOutcome::Infeasible(_) => ("infeasible", None),
            };
            to_csv(std::iter::once(Row {
                status,
                monthly_contribution: result.monthly_contribution(),
                terminal_value,
                search_max: result.search_max,
                iterations: result.iterations.len(),
            }))
        }
        OutputFormat::Text => Ok(match response.result.outcome {
            GoalOutcome::Found {
                monthly_contribution,
                ..
            } => format!(
                "You need to save {monthly_contribution:.2} per month to reach {:.2} in {} years.\n",
                response.target_value, response.years
            ),
            GoalOutcome::Infeasible(reason) => format!(
                "It is not possible to reach the savings goal with the given parameters: {}.\n",
                describe_infeasible(reason)
            ),
        }),
    }
}

fn render_inflation(response: &InflationResponse, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(response),
        OutputFormat::Csv => to_csv(std::iter::once(response)),
        OutputFormat::Text => Ok(format!(
            "{:.2} at {:.2}% inflation over {} years is worth {:.2} in today's money.\n",
            response.amount,
            response.annual_rate * 100.0,
            response.years,
            response.adjusted_amount
        )),
    }
}

fn describe_infeasible(reason: InfeasibleReason) -> String {
    match reason {
        InfeasibleReason::ExceedsTargetWithoutContributions { terminal_value } => format!(
            "the initial capital alone grows to {terminal_value:.2}, above the goal"
        ),
        InfeasibleReason::SearchBoundExhausted { search_max } => {
            format!("no contribution up to {search_max:.2} per month reaches the goal")
        }
        InfeasibleReason::NotConverged { iterations } => {
            format!("the search did not converge within {iterations} iterations")
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|json| format!("{json}\n"))
        .map_err(|e| format!("failed to encode JSON: {e}"))
}

fn to_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| format!("failed to write CSV row: {e}"))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| format!("failed to flush CSV: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("CSV output is not UTF-8: {e}"))
}
