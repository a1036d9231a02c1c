use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use reqwest::Client;
use serde_json::Value;

use parkease::api::ApiService;
use parkease::auth::{AuthManager, RegisterRequest, TokenStore};
use parkease::booking::{BookingFlow, BookingStep};
use parkease::config::{
    Command, Config, InventoryCommand, LogFormat, SpacesCommand, TransactionsCommand,
    UsersCommand, VehiclesCommand,
};
use parkease::error::ClientError;
use parkease::http_client::{build_http_client, AuthenticatedClient};
use parkease::inventory::{InventoryStore, InventorySummary, InventoryUpdate, NewInventoryItem};
use parkease::models::{
    CardDetails, CustomerInfo, GarageSummary, LotSummary, ManagedUser, SpaceStatus,
};
use parkease::payment::PaymentProcessor;
use parkease::validation;

const TERMS_TEXT: &str = "\
Parking Terms and Conditions
  - Bookings are charged at $10.00 per space.
  - Vehicles must display the registered plate number.
  - The operator is not liable for loss or damage to parked vehicles.";

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    tracing::debug!("API base URL: {}", config.api_url);

    let http = build_http_client(config.http_connect_timeout, config.http_request_timeout)?;
    let store = TokenStore::open(&config.session_db)?;
    let auth = AuthManager::new(store, http.clone(), config.api_url.clone());
    let api = ApiService::new(AuthenticatedClient::new(http.clone(), auth.clone()));

    if let Err(e) = run(&config, command, &auth, &api, &http).await {
        match e.downcast_ref::<ClientError>() {
            Some(client_err) if client_err.requires_login() => {
                eprintln!("{}", client_err);
                eprintln!("Run `parkease login` to start a new session.");
            }
            _ => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    config: &Config,
    command: Command,
    auth: &AuthManager,
    api: &ApiService,
    http: &Client,
) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let email = match email {
                Some(email) => email,
                None => Input::new().with_prompt("Email").interact_text()?,
            };
            let password = match password {
                Some(password) => password,
                None => Password::new().with_prompt("Password").interact()?,
            };
            validation::require_field("email", &email)?;
            validation::require_field("password", &password)?;

            auth.login(&email, &password).await?;
            println!("Logged in successfully!");
        }

        Command::Register { email, username } => {
            let password = Password::new().with_prompt("Password").interact()?;
            let confirmation = Password::new().with_prompt("Confirm password").interact()?;
            validation::validate_password_confirmation(&password, &confirmation)?;

            let request = RegisterRequest {
                email,
                username,
                password,
            };
            // Logged-in staff register through the admin variant
            if auth.store().is_authenticated()? {
                api.register_user(&request).await?;
            } else {
                auth.register(&request).await?;
            }
            println!("Registered successfully! Please log in.");
        }

        Command::Logout => {
            auth.logout()?;
            println!("Logged out.");
        }

        Command::Status => {
            if !auth.store().is_authenticated()? {
                println!("Not logged in.");
                return Ok(());
            }
            let is_admin = api.check_admin().await?;
            println!("Logged in{}.", if is_admin { " (admin)" } else { "" });
        }

        Command::Spaces(SpacesCommand::List) => {
            let spaces = api.list_spaces().await?;
            for row in spaces.chunks(10) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|s| {
                        let mark = if s.status.is_available() { ' ' } else { 'X' };
                        format!("[{:>3}{}]", s.number(), mark)
                    })
                    .collect();
                println!("{}", cells.join(" "));
            }
            let summary = LotSummary::from_spaces(&spaces);
            println!(
                "Available spaces: {}  Booked spaces: {}",
                summary.available, summary.booked
            );
        }

        Command::Spaces(SpacesCommand::SetStatus { space, status }) => {
            api.update_space_status(space, SpaceStatus::from(status)).await?;
            println!("Space {} updated.", space);
        }

        Command::Book { space } => {
            book_space(config, api, http, space).await?;
        }

        Command::Vehicles(cmd) => match cmd {
            VehiclesCommand::List => print_records(&api.list_vehicles().await?),
            VehiclesCommand::Get { id } => print_json(&api.get_vehicle(&id).await?),
            VehiclesCommand::Add(record) => print_json(&api.create_vehicle(&record.parse()?).await?),
            VehiclesCommand::Update { id, record } => {
                print_json(&api.update_vehicle(&id, &record.parse()?).await?)
            }
        },

        Command::Transactions(cmd) => match cmd {
            TransactionsCommand::List => {
                let transactions = api.list_transactions().await?;
                print_records(&transactions);
                let summary = GarageSummary::from_transactions(&transactions);
                println!(
                    "Total transactions: {}  Total revenue: ${:.2}",
                    summary.transactions, summary.revenue
                );
            }
            TransactionsCommand::Add(record) => {
                print_json(&api.create_transaction(&record.parse()?).await?)
            }
        },

        Command::Users(cmd) => match cmd {
            UsersCommand::Search { email } => print_json(&api.search_user(&email).await?),
            UsersCommand::Add => {
                let user = prompt_managed_user(ManagedUser::default(), true)?;
                let today = chrono::Local::now().date_naive();
                print_json(&api.register_user_with_payment(&user, today).await?);
                println!("User {} has been added.", user.email);
            }
            UsersCommand::Edit { id, email } => {
                let current = match email {
                    Some(email) => existing_user(api, &email).await?,
                    None => ManagedUser::default(),
                };
                let user = prompt_managed_user(current, false)?;
                let today = chrono::Local::now().date_naive();
                print_json(&api.update_user(id, &user, today).await?);
                println!("User {} has been updated.", id);
            }
            UsersCommand::Delete { id } => {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete user {}?", id))
                    .default(false)
                    .interact()?;
                if confirmed {
                    api.delete_user(id).await?;
                    println!("User {} has been deleted.", id);
                }
            }
        },

        Command::Inventory(cmd) => {
            let inventory = InventoryStore::open(&config.session_db)?;
            match cmd {
                InventoryCommand::List => {
                    let items = inventory.list()?;
                    if items.is_empty() {
                        println!("(none)");
                    }
                    for item in &items {
                        println!(
                            "{:>4}  {:<24} {:>6}  ${:>8.2}  ${:>10.2}",
                            item.id,
                            item.name,
                            item.quantity,
                            item.cost,
                            item.value()
                        );
                    }
                    let summary = InventorySummary::from_items(&items);
                    println!(
                        "Total items: {}  Total value: ${:.2}",
                        summary.total_items, summary.total_value
                    );
                }
                InventoryCommand::Add {
                    name,
                    quantity,
                    cost,
                } => {
                    let item = inventory.add(&NewInventoryItem {
                        name,
                        quantity,
                        cost,
                    })?;
                    println!("Added item {} ({}).", item.id, item.name);
                }
                InventoryCommand::Edit {
                    id,
                    name,
                    quantity,
                    cost,
                } => {
                    let item = inventory.update(
                        id,
                        &InventoryUpdate {
                            name,
                            quantity,
                            cost,
                        },
                    )?;
                    println!("Updated item {} ({}).", item.id, item.name);
                }
                InventoryCommand::Delete { id } => {
                    inventory.delete(id)?;
                    println!("Item {} has been deleted.", id);
                }
            }
        }
    }

    Ok(())
}

/// Interactive booking: terms, customer details, then card payment
async fn book_space(config: &Config, api: &ApiService, http: &Client, space_number: i64) -> Result<()> {
    let publishable_key = config.require_publishable_key()?;
    let processor = PaymentProcessor::new(http.clone(), config.payment_api_url.clone(), publishable_key);

    let spaces = api.list_spaces().await?;
    let space = spaces
        .iter()
        .find(|s| s.number() == space_number)
        .ok_or_else(|| anyhow::anyhow!("Space {} does not exist", space_number))?;

    let mut flow = BookingFlow::new();
    flow.select_space(space)?;

    println!("{}", TERMS_TEXT);
    let accepted = Confirm::new()
        .with_prompt("I have read and agree to the terms and conditions")
        .default(false)
        .interact()?;
    if !accepted {
        flow.decline_terms();
        println!("Booking cancelled.");
        return Ok(());
    }
    flow.accept_terms(true)?;

    let customer = CustomerInfo {
        first_name: Input::new().with_prompt("First name").interact_text()?,
        last_name: Input::new().with_prompt("Last name").interact_text()?,
        phone_number: Input::new().with_prompt("Phone number").interact_text()?,
        address: Input::new().with_prompt("Address").interact_text()?,
        email: Input::new().with_prompt("Email").interact_text()?,
    };
    flow.submit_customer(customer)?;

    let card = CardDetails {
        number: Input::new().with_prompt("Card number").interact_text()?,
        expiration: Input::new().with_prompt("Expiration (MM/YY)").interact_text()?,
        cvv: Password::new().with_prompt("CVV").interact()?,
    };

    let today = chrono::Local::now().date_naive();
    let receipt = match flow.pay(api, &processor, &card, today).await {
        Ok(receipt) => receipt,
        Err(e) if matches!(flow.step(), BookingStep::Charged { .. }) => {
            // Charged already; only the status update is repeated
            eprintln!("Payment went through but marking the space failed: {}", e);
            let retry = Confirm::new()
                .with_prompt("Retry marking the space as booked?")
                .default(true)
                .interact()?;
            if !retry {
                return Err(e.into());
            }
            flow.pay(api, &processor, &card, today).await?
        }
        Err(e) => return Err(e.into()),
    };

    println!("Payment successful. Space {} is now booked.", space_number);
    print_json(&receipt);
    Ok(())
}

/// First record returned by the email search, as a user-management form
async fn existing_user(api: &ApiService, email: &str) -> Result<ManagedUser> {
    let found = api.search_user(email).await?;
    let record = match found {
        Value::Array(mut records) if !records.is_empty() => records.swap_remove(0),
        Value::Object(_) => found,
        _ => anyhow::bail!("No user found with email {}", email),
    };
    Ok(serde_json::from_value(record)?)
}

fn prompt_text(prompt: &str, initial: &str) -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()?)
}

/// Walk through the personal, payment and vehicle sections of a user record
fn prompt_managed_user(initial: ManagedUser, with_password: bool) -> Result<ManagedUser> {
    let mut user = initial;

    user.first_name = prompt_text("First name", &user.first_name)?;
    user.last_name = prompt_text("Last name", &user.last_name)?;
    user.email = prompt_text("Email", &user.email)?;
    user.phone_number = prompt_text("Phone number", &user.phone_number)?;
    user.address = prompt_text("Address", &user.address)?;
    user.username = prompt_text("Username", &user.username)?;
    if with_password {
        let password = Password::new().with_prompt("Password").interact()?;
        let confirmation = Password::new().with_prompt("Confirm password").interact()?;
        validation::validate_password_confirmation(&password, &confirmation)?;
        user.password = password;
    }

    user.card_number = prompt_text("Card number", &user.card_number)?;
    user.expiration_date = prompt_text("Expiration (MM/YY)", &user.expiration_date)?;
    user.cvv = Password::new().with_prompt("CVV").interact()?;
    user.billing_address = prompt_text("Billing address", &user.billing_address)?;

    user.driver_license = prompt_text("Driver license", &user.driver_license)?;
    user.driver_license_expiration =
        prompt_text("Driver license expiration", &user.driver_license_expiration)?;
    user.insurance = prompt_text("Insurance", &user.insurance)?;

    let count = Input::<usize>::new()
        .with_prompt("Number of vehicles")
        .default(user.number_of_vehicles)
        .interact_text()?;
    if count != user.vehicles.len() {
        user.set_vehicle_count(count);
    }
    for (index, vehicle) in user.vehicles.iter_mut().enumerate() {
        vehicle.registration =
            prompt_text(&format!("Vehicle {} registration", index + 1), &vehicle.registration)?;
        vehicle.plate_number =
            prompt_text(&format!("Vehicle {} plate number", index + 1), &vehicle.plate_number)?;
    }
    user.number_of_vehicles = user.vehicles.len();

    Ok(user)
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn print_records(records: &[Value]) {
    if records.is_empty() {
        println!("(none)");
    }
    for record in records {
        println!("{}", record);
    }
}
