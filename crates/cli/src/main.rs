use clap::{Parser, Subcommand};
use obs_core::{
    AlertResult, BloodPressure, Consciousness, CoreConfig, HistoryRecord, IdentityService,
    ReadingStore, VitalReading, VitalsAssessor,
};
use obs_types::{DateOfBirth, PatientName};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "obs")]
#[command(about = "OBS patient vitals tracking CLI")]
struct Cli {
    /// Data directory for the mapping and vitals files
    #[arg(long, env = "OBS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new vitals reading for a patient
    Add {
        /// Patient full name
        name: String,
        /// Date of birth (dd/mm/yy)
        dob: String,
        /// Systolic blood pressure (mmHg)
        #[arg(long)]
        systolic: u16,
        /// Diastolic blood pressure (mmHg)
        #[arg(long)]
        diastolic: u16,
        /// Heart rate (bpm)
        #[arg(long)]
        heart_rate: u16,
        /// Respiratory rate (breaths per minute)
        #[arg(long)]
        respiratory_rate: u16,
        /// Temperature (°C)
        #[arg(long)]
        temperature: f64,
        /// Oxygen saturations (%)
        #[arg(long)]
        oxygen_sats: u8,
        /// Fully awake and responsive? (yes/no/unsure)
        #[arg(long)]
        conscious: String,
    },
    /// Show the most recent readings for a patient
    History {
        /// Patient full name
        name: String,
        /// Date of birth (dd/mm/yy)
        dob: String,
    },
    /// Look up a patient id without creating one
    Lookup {
        /// Patient full name
        name: String,
        /// Date of birth (dd/mm/yy)
        dob: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = obs_core::data_dir_from_env_value(
        cli.data_dir.map(|p| p.to_string_lossy().into_owned()),
    );
    let cfg = Arc::new(CoreConfig::new(data_dir));

    match cli.command {
        Commands::Add {
            name,
            dob,
            systolic,
            diastolic,
            heart_rate,
            respiratory_rate,
            temperature,
            oxygen_sats,
            conscious,
        } => {
            let result = add_reading(
                &cfg,
                &name,
                &dob,
                BloodPressure {
                    systolic,
                    diastolic,
                },
                heart_rate,
                respiratory_rate,
                temperature,
                oxygen_sats,
                &conscious,
            );
            if let Err(e) = result {
                eprintln!("Error recording reading: {e}");
                std::process::exit(1);
            }
        }
        Commands::History { name, dob } => {
            if let Err(e) = show_history(&cfg, &name, &dob) {
                eprintln!("Error reading history: {e}");
                std::process::exit(1);
            }
        }
        Commands::Lookup { name, dob } => {
            if let Err(e) = lookup(&cfg, &name, &dob) {
                eprintln!("Error looking up patient: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn add_reading(
    cfg: &Arc<CoreConfig>,
    name: &str,
    dob: &str,
    blood_pressure: BloodPressure,
    heart_rate: u16,
    respiratory_rate: u16,
    temperature: f64,
    oxygen_sats: u8,
    conscious: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = PatientName::new(name)?;
    let dob = DateOfBirth::parse(dob)?;
    let consciousness: Consciousness = conscious.parse()?;

    let reading = VitalReading::new(
        blood_pressure,
        heart_rate,
        respiratory_rate,
        temperature,
        oxygen_sats,
        consciousness,
    )?;

    let assessor = VitalsAssessor::news2();
    let assessment = assessor.assess(&reading)?;

    let identity = IdentityService::new(cfg.clone());
    let patient_id = identity.resolve(&name, &dob)?;

    let store = ReadingStore::new(cfg.clone());
    store.append(patient_id, assessment.total_score, &reading)?;

    let alerts = &assessment.alerts;
    print_alert("Blood pressure (systolic)", &alerts.blood_pressure.systolic);
    print_alert("Blood pressure (diastolic)", &alerts.blood_pressure.diastolic);
    print_alert("Heart rate", &alerts.heart_rate);
    print_alert("Respiratory rate", &alerts.respiratory_rate);
    print_alert("Temperature", &alerts.temperature);
    print_alert("Oxygen saturations", &alerts.oxygen_saturations);
    print_alert("Awake and responsive?", &alerts.consciousness);
    println!("Total NEWS2 score: {}", assessment.total_score);
    println!("Reading recorded for patient {patient_id}");

    Ok(())
}

fn print_alert(label: &str, result: &AlertResult) {
    let score_note = match result.score {
        Some(score) => format!("(Score: {score})"),
        None => "(Not scored)".to_string(),
    };
    // JSON strings display with quotes; show the bare value.
    let value = match &result.value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    println!("{label}: {value} → {} {score_note}", result.message);
}

fn show_history(
    cfg: &Arc<CoreConfig>,
    name: &str,
    dob: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = PatientName::new(name)?;
    let dob = DateOfBirth::parse(dob)?;

    let identity = IdentityService::new(cfg.clone());
    let Some(patient_id) = identity.find(&name, &dob)? else {
        println!("No matching patient found.");
        return Ok(());
    };

    let store = ReadingStore::new(cfg.clone());
    let records = store.query(patient_id)?;
    if records.is_empty() {
        println!("No data found for patient {patient_id}");
        return Ok(());
    }

    let show = records.len().min(5);
    println!(
        "Patient {patient_id} has {} recorded vital sign entries. Showing the last {show}:",
        records.len()
    );
    for record in &records[records.len() - show..] {
        print_record(record);
    }

    Ok(())
}

fn print_record(record: &HistoryRecord) {
    println!(
        "{} | BP: {}/{} mmHg | HR: {} bpm | RR: {} bpm | Temp: {} °C | O2 sats: {} % | Awake and responsive?: {} | NEWS2: {}",
        record.timestamp,
        cell(&record.bp_systolic),
        cell(&record.bp_diastolic),
        cell(&record.heart_rate),
        cell(&record.respiratory_rate),
        cell(&record.temperature),
        cell(&record.oxygen_sats),
        cell(&record.loc),
        cell(&record.news2_score),
    );
}

/// Renders an optional cell, showing unknown values as "?" rather than zero.
fn cell<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "?".to_string(),
    }
}

fn lookup(
    cfg: &Arc<CoreConfig>,
    name: &str,
    dob: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = PatientName::new(name)?;
    let dob = DateOfBirth::parse(dob)?;

    let identity = IdentityService::new(cfg.clone());
    match identity.find(&name, &dob)? {
        Some(patient_id) => println!("Patient found. ID: {patient_id}"),
        None => println!("No matching patient found."),
    }

    Ok(())
}
