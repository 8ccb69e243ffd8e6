use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::{PolicyLoader, PolicySet};
use payroll_engine::export::export_payroll_csv;
use payroll_engine::models::{
    DeductionAmount, DeductionKind, EmployeeStatus, FilingStatus, Money, NewDeduction,
    NewEmployee, PayFrequency, PayPeriod,
};
use payroll_engine::repository::JsonFileRepository;
use payroll_engine::service::{PayrollService, RunOptions};

#[derive(Parser)]
#[command(
    name = "payroll",
    version,
    about = "Gross-to-net payroll engine",
    long_about = "Runs payroll for salaried and hourly employees: federal bracket \
                  withholding, Social Security and Medicare with wage caps, state tax, \
                  pre-tax and post-tax deductions, and year-to-date ledgers."
)]
struct Cli {
    /// JSON data file
    #[arg(long, env = "PAYROLL_DATA", default_value = "payroll_data.json")]
    data: PathBuf,

    /// Tax policy directory (policy.yaml + years/*.yaml); built-in 2024 policy when omitted
    #[arg(long, env = "PAYROLL_POLICY_DIR")]
    policy_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hire an employee
    AddEmployee {
        /// Full name
        #[arg(long)]
        name: String,
        /// Annual salary
        #[arg(long)]
        salary: Money,
        /// Hourly rate (makes the employee hourly)
        #[arg(long)]
        hourly_rate: Option<Money>,
        /// weekly, biweekly, semi_monthly or monthly
        #[arg(long, default_value = "biweekly")]
        frequency: PayFrequency,
        /// single, married or head_of_household
        #[arg(long, default_value = "single")]
        filing_status: FilingStatus,
        /// Withholding allowances
        #[arg(long, default_value_t = 1)]
        allowances: u32,
        /// Two-letter state code
        #[arg(long, default_value = "CA")]
        state: String,
        /// Department
        #[arg(long, default_value = "")]
        department: String,
        /// Job title
        #[arg(long, default_value = "")]
        title: String,
        /// Email
        #[arg(long, default_value = "")]
        email: String,
        /// Hire date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        hire_date: Option<NaiveDate>,
    },

    /// Change an employee's status
    Status {
        /// Employee ID
        employee_id: String,
        /// active, terminated or on_leave
        status: EmployeeStatus,
    },

    /// Deduction management
    #[command(subcommand)]
    Deduction(DeductionCommands),

    /// Run payroll for one employee
    Run {
        /// Employee ID
        employee_id: String,
        #[command(flatten)]
        period: PeriodArgs,
        /// Hours worked (hourly employees)
        #[arg(long)]
        hours: Option<Decimal>,
        /// Extra overtime hours
        #[arg(long)]
        overtime: Option<Decimal>,
        /// Clamp taxable gross at zero when pre-tax deductions exceed gross
        #[arg(long)]
        clamp: bool,
    },

    /// Run payroll for many employees in parallel
    Bulk {
        #[command(flatten)]
        period: PeriodArgs,
        /// Employee IDs; every active employee when omitted
        #[arg(long = "employee")]
        employees: Vec<String>,
    },

    /// Print a year-end W2 summary
    W2 {
        /// Employee ID
        employee_id: String,
        /// Calendar year
        #[arg(long)]
        year: i32,
    },

    /// List employees
    List {
        /// Only employees with this status
        #[arg(long)]
        status: Option<EmployeeStatus>,
    },

    /// Export the payroll register as CSV
    Export {
        /// Calendar year
        #[arg(long)]
        year: i32,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "PAYROLL_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum DeductionCommands {
    /// Add a deduction
    Add {
        /// Employee ID
        employee_id: String,
        /// Deduction type, e.g. pre_tax_401k or post_tax_roth
        #[arg(long = "type")]
        kind: DeductionKind,
        /// Flat amount, or a percentage of gross with --percent
        #[arg(long)]
        amount: Decimal,
        /// Treat the amount as a percentage of gross
        #[arg(long)]
        percent: bool,
        /// Description shown on paystubs
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Stop taking a deduction
    Deactivate {
        /// Deduction ID
        deduction_id: String,
    },
}

#[derive(clap::Args)]
struct PeriodArgs {
    /// First day of the work window (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// Last day of the work window (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
    /// Pay date (YYYY-MM-DD)
    #[arg(long)]
    pay_date: NaiveDate,
}

impl PeriodArgs {
    fn period(&self) -> Result<PayPeriod> {
        Ok(PayPeriod::new(self.start, self.end, self.pay_date)?)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let policies = load_policies(cli.policy_dir.as_ref())?;
    let repository = JsonFileRepository::open(&cli.data)
        .with_context(|| format!("Failed to open data file {}", cli.data.display()))?;
    let service = PayrollService::new(Arc::new(repository), policies);

    match cli.command {
        Commands::AddEmployee {
            name,
            salary,
            hourly_rate,
            frequency,
            filing_status,
            allowances,
            state,
            department,
            title,
            email,
            hire_date,
        } => {
            let new = NewEmployee {
                name,
                annual_salary: salary,
                hourly_rate,
                pay_frequency: frequency,
                filing_status,
                withholding_allowances: allowances,
                state,
                department,
                title,
                email,
            };
            let hire_date = hire_date.unwrap_or_else(|| Utc::now().date_naive());
            let employee = service.add_employee(new, hire_date)?;
            println!("Added employee {} ({})", employee.id, employee.name);
        }
        Commands::Status {
            employee_id,
            status,
        } => {
            let employee = service.set_employee_status(&employee_id, status)?;
            println!("{} is now {}", employee.id, employee.status);
        }
        Commands::Deduction(DeductionCommands::Add {
            employee_id,
            kind,
            amount,
            percent,
            description,
        }) => {
            let amount = if percent {
                DeductionAmount::Percentage(amount)
            } else {
                DeductionAmount::Flat(Money::new(amount))
            };
            let deduction = service.add_deduction(NewDeduction {
                employee_id,
                kind,
                amount,
                description,
            })?;
            println!(
                "Added deduction {} ({} {}) for {}",
                deduction.id, deduction.kind, deduction.amount, deduction.employee_id
            );
        }
        Commands::Deduction(DeductionCommands::Deactivate { deduction_id }) => {
            let deduction = service.deactivate_deduction(&deduction_id)?;
            println!("Deactivated deduction {}", deduction.id);
        }
        Commands::Run {
            employee_id,
            period,
            hours,
            overtime,
            clamp,
        } => {
            let options = RunOptions {
                hours,
                overtime_hours: overtime,
                clamp_taxable_gross: clamp,
            };
            let run = service.run_payroll_with(&employee_id, &period.period()?, &options)?;
            print_paystub(&run.paystub);
            for warning in &run.result.audit_trace.warnings {
                println!("WARNING [{}]: {}", warning.code, warning.message);
            }
        }
        Commands::Bulk { period, employees } => {
            let period = period.period()?;
            let report = if employees.is_empty() {
                service.run_bulk_active(&period)?
            } else {
                service.run_bulk(&employees, &period)
            };
            for stub in &report.succeeded {
                println!(
                    "OK     {:<12} {:<24} net {:>12} {}",
                    stub.employee_id, stub.employee_name, stub.net_pay, stub.check_number
                );
            }
            for failure in &report.failed {
                println!("FAILED {:<12} {}", failure.employee_id, failure.error);
            }
            println!(
                "{} succeeded, {} failed",
                report.succeeded.len(),
                report.failed.len()
            );
        }
        Commands::W2 { employee_id, year } => {
            let summary = service.year_end_summary(&employee_id, year)?;
            println!("W2 {} for {} ({})", year, summary.employee_name, summary.employee_id);
            println!("  Paystubs:                        {}", summary.paystub_count);
            println!("  Box 1 Wages:                     {:>12}", summary.w2_box1);
            println!("  Box 2 Federal tax withheld:      {:>12}", summary.w2_box2);
            println!("  Box 3 Social Security wages:     {:>12}", summary.w2_box3);
            println!("  Box 4 Social Security withheld:  {:>12}", summary.w2_box4);
            println!("  Box 5 Medicare wages:            {:>12}", summary.w2_box5);
            println!("  Box 6 Medicare withheld:         {:>12}", summary.w2_box6);
        }
        Commands::List { status } => {
            let employees = service.list_employees(status)?;
            if employees.is_empty() {
                println!("No employees.");
            }
            for e in employees {
                println!(
                    "{:<12} {:<24} {:<12} {:<10} {:>12} YTD gross {:>12}",
                    e.id,
                    e.name,
                    e.pay_frequency,
                    e.status,
                    e.annual_salary,
                    e.ytd.gross
                );
            }
        }
        Commands::Export { year, output } => {
            let rows = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    export_payroll_csv(service.repository().as_ref(), year, BufWriter::new(file))?
                }
                None => {
                    export_payroll_csv(service.repository().as_ref(), year, io::stdout().lock())?
                }
            };
            eprintln!("Exported {} paystubs", rows);
        }
        Commands::Serve { bind } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(serve(service, &bind))?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_policies(dir: Option<&PathBuf>) -> Result<PolicySet> {
    let Some(dir) = dir else {
        return Ok(PolicySet::builtin());
    };
    let policies = PolicyLoader::load(dir)
        .with_context(|| format!("Failed to load tax policy from {}", dir.display()))?;
    if policies.is_empty() {
        bail!("No tax policies found in {}", dir.display());
    }
    Ok(policies)
}

async fn serve(service: PayrollService, bind: &str) -> Result<()> {
    let router = create_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(bind = %bind, "Payroll API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

fn print_paystub(stub: &payroll_engine::models::Paystub) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "Paystub {}  {}", stub.check_number, stub.employee_name);
    let _ = writeln!(
        out,
        "Period {} to {}, paid {}",
        stub.pay_period.start_date, stub.pay_period.end_date, stub.pay_period.pay_date
    );
    for line in &stub.lines {
        let sign = if line.is_deduction { "-" } else { " " };
        let ytd = line
            .ytd_amount
            .map(|a| format!("YTD {:>12}", a))
            .unwrap_or_default();
        let _ = writeln!(out, "  {:<32} {}{:>11}  {}", line.label, sign, line.amount, ytd);
    }
    let _ = writeln!(out, "  {:<32}  {:>11}  YTD {:>12}", "Net Pay", stub.net_pay, stub.ytd_net);
}
