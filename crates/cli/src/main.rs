use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clinic_core::seed::seed_demo_data;
use clinic_core::{
    AppointmentService, CredentialService, PatientService, SharedDatabase, DEFAULT_DATA_DIR,
};
use clinic_types::Role;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic management backend CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the demo accounts and demo patient
    Seed,
    /// List all registered patients
    ListPatients,
    /// Show a doctor's free slots for a date
    Slots {
        /// Doctor account email
        doctor_email: String,
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let db = SharedDatabase::new(data_dir.into());

    match cli.command {
        Some(Commands::Seed) => {
            let users = CredentialService::new(db.clone());
            let patients = PatientService::new(db);
            for line in seed_demo_data(&users, &patients)? {
                println!("{line}");
            }
        }
        Some(Commands::ListPatients) => {
            let patients = PatientService::new(db).list_all()?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "{}  {} ({}, {}), mobile {}, registered {}",
                        patient.patient_id,
                        patient.name,
                        patient.age,
                        patient.gender,
                        patient.mobile,
                        patient.registration_date
                    );
                }
            }
        }
        Some(Commands::Slots { doctor_email, date }) => {
            let users = CredentialService::new(db.clone());
            let doctor = users
                .find_by_email(&doctor_email)?
                .filter(|u| u.role == Role::Doctor)
                .ok_or_else(|| format!("no doctor with email {doctor_email}"))?;
            let date: NaiveDate = date.parse()?;

            let free = AppointmentService::new(db).available_slots(doctor.id, date)?;
            if free.is_empty() {
                println!("No free slots for {} on {}.", doctor.name, date);
            } else {
                println!("Free slots for {} on {}:", doctor.name, date);
                for slot in free {
                    println!("  {slot}");
                }
            }
        }
        None => {
            println!("Use --help to see available commands.");
        }
    }

    Ok(())
}
