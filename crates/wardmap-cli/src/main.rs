use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;
use validator::Validate;

use wardmap_cli::seeder::{self, DemoConfig};
use wardmap_models::ids::DepartmentId;
use wardmap_models::users::CreateUserDto;

#[derive(Parser)]
#[command(name = "wardmap-cli")]
#[command(about = "Wardmap CLI - Administrative tools for Wardmap", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed lookups, divisions, departments, secret questions and starter users
    Seed,
    /// Seed generated doctors and catalog items
    SeedDemo {
        /// Number of doctors to create
        #[arg(long, default_value = "25")]
        doctors: usize,

        /// Number of items to create
        #[arg(long, default_value = "100")]
        items: usize,
    },
    /// Create a user account
    CreateUser {
        /// Employee id used to log in
        #[arg(short = 'e', long)]
        employee_id: Option<String>,

        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'm', long)]
        middle_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'd', long)]
        department_id: Option<i32>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Remove generated doctors and demo items
    ClearDemo,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    match cli.command {
        Commands::Seed => {
            seeder::seed_reference(&pool).await?;
        }
        Commands::SeedDemo { doctors, items } => {
            seeder::seed_demo(&pool, DemoConfig { doctors, items }).await?;
        }
        Commands::CreateUser {
            employee_id,
            first_name,
            middle_name,
            last_name,
            department_id,
            password,
        } => {
            let dto = CreateUserDto {
                employee_id: prompt_or(employee_id, "Employee id")?,
                first_name: prompt_or(first_name, "First name")?,
                middle_name,
                last_name: prompt_or(last_name, "Last name")?,
                password: match password {
                    Some(password) => password,
                    None => Password::new()
                        .with_prompt("Password")
                        .with_confirmation("Confirm password", "Passwords don't match")
                        .interact()?,
                },
                department_id: department_id.map(DepartmentId),
            };
            create_user(&pool, dto).await?;
        }
        Commands::ClearDemo => {
            seeder::clear_demo(&pool).await?;
        }
    }

    Ok(())
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String, dialoguer::Error> {
    match value {
        Some(value) => Ok(value),
        None => Input::new().with_prompt(prompt).interact_text(),
    }
}

async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<(), Box<dyn std::error::Error>> {
    dto.validate()?;

    let password_hash = wardmap_core::hash_password(&dto.password)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let id: Option<i32> = sqlx::query_scalar(
        "INSERT INTO users (employee_id, first_name, middle_name, last_name, password, department_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT DO NOTHING
         RETURNING id",
    )
    .bind(dto.employee_id.trim())
    .bind(dto.first_name.trim())
    .bind(dto.middle_name.as_deref().map(str::trim))
    .bind(dto.last_name.trim())
    .bind(&password_hash)
    .bind(dto.department_id)
    .fetch_optional(db)
    .await?;

    match id {
        Some(id) => {
            println!("\n✅ User created successfully!");
            println!("   Id: {}", id);
            println!("   Employee id: {}", dto.employee_id.trim());
            println!("   Name: {} {}", dto.first_name.trim(), dto.last_name.trim());
            Ok(())
        }
        None => Err("A user with this employee id or full name already exists".into()),
    }
}
