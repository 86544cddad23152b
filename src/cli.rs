use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::{
    auth::commands as auth_commands,
    capture::StillImageCamera,
    display::{
        condition_style, format_timestamp, watering_label, SOIL_OPTIONS, SUNLIGHT_OPTIONS,
        WATERING_OPTIONS,
    },
    models::ProgressEntry,
    plants::{commands as plant_commands, PlantEdit},
    progress::commands as progress_commands,
    workflow::{commands as workflow_commands, CameraAccess, IdentifyController, WorkflowEvent},
    AppState,
};

/// Plant care client
#[derive(Parser)]
#[command(name = "plantcare")]
#[command(about = "Identify, save and track your plants", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides $PLANTCARE_BASE_URL and the settings file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory for the token store, settings and captured photos
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Debug logging and a faster loading ticker
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        fullname: String,
    },

    /// Show the signed-in user
    Whoami,

    /// Forget the stored token
    Logout,

    /// Identify the plant in a photo, optionally saving a match
    Identify {
        photo: PathBuf,

        /// 0 keeps the AI pick, 1.. chooses an alternative
        #[arg(long, default_value_t = 0)]
        pick: usize,

        /// Save the chosen match to your collection
        #[arg(long)]
        save: bool,
    },

    /// Manage saved plants
    Plants {
        #[command(subcommand)]
        action: PlantCommands,
    },

    /// Record plant progress
    Progress {
        #[command(subcommand)]
        action: ProgressCommands,
    },

    /// List the watering, sunlight and soil choices
    Options,

    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum PlantCommands {
    List,
    Show {
        id: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Watering frequency in days
        #[arg(long)]
        water_days: Option<u32>,
        #[arg(long)]
        sunlight: Option<String>,
        #[arg(long)]
        soil: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ProgressCommands {
    /// Upload a progress photo for a saved plant
    Add {
        plant_id: String,
        photo: PathBuf,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    Show,
    /// Persist the backend base URL
    SetBaseUrl {
        url: String,
    },
}

pub async fn execute(cli: Cli) -> Result<()> {
    let data_dir = match cli.data_dir.clone() {
        Some(dir) => dir,
        None => crate::settings::data_dir()?,
    };

    // Settings commands work before a backend is configured.
    if let Commands::Config { action } = &cli.command {
        return run_config(action, &data_dir, cli.json);
    }
    if let Commands::Options = &cli.command {
        return print_options(cli.json);
    }

    let state = AppState::open(data_dir, cli.base_url.clone(), cli.debug)?;
    let json = cli.json;

    match cli.command {
        Commands::Login { username, password } => {
            let user = auth_commands::sign_in(&state, &username, &password)
                .await
                .map_err(|e| anyhow!(e))?;
            output(json, &user, || format!("Signed in as {}", user.display_name()))
        }
        Commands::Register {
            username,
            password,
            fullname,
        } => {
            auth_commands::sign_up(&state, &username, &password, &fullname)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("Account created. Sign in with `plantcare login`.");
            Ok(())
        }
        Commands::Whoami => {
            auth_commands::restore_session(&state)
                .await
                .map_err(|e| anyhow!(e))?;
            match auth_commands::current_user(&state).await {
                Some(user) => output(json, &user, || user.display_name().to_string()),
                None => Err(anyhow!("Not signed in")),
            }
        }
        Commands::Logout => {
            auth_commands::sign_out(&state).await.map_err(|e| anyhow!(e))?;
            println!("Signed out");
            Ok(())
        }
        Commands::Identify { photo, pick, save } => {
            run_identify(&state, photo, pick, save, json).await
        }
        Commands::Plants { action } => run_plants(&state, action, json).await,
        Commands::Progress { action } => run_progress(&state, action, json).await,
        Commands::Options | Commands::Config { .. } => Ok(()),
    }
}

async fn run_identify(
    state: &AppState,
    photo: PathBuf,
    pick: usize,
    save: bool,
    json: bool,
) -> Result<()> {
    let controller = workflow_commands::start_identify(state, Arc::new(StillImageCamera::new(photo)));

    let mut events = controller.subscribe();
    let quiet = json;
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let WorkflowEvent::LoadingMessage { message } = event {
                if !quiet {
                    eprintln!("{message}");
                }
            }
        }
    });

    let outcome = identify_flow(&controller, pick, save, json).await;
    workflow_commands::close_identify(&controller).await;
    printer.abort();
    outcome
}

async fn identify_flow(
    controller: &IdentifyController,
    pick: usize,
    save: bool,
    json: bool,
) -> Result<()> {
    if let CameraAccess::PermissionRequired(status) = workflow_commands::open_camera(controller)
        .await
        .map_err(|e| anyhow!(e))?
    {
        return Err(anyhow!("camera permission {status:?}"));
    }
    workflow_commands::capture_photo(controller)
        .await
        .map_err(|e| anyhow!(e))?;
    let review = workflow_commands::identify_photo(controller)
        .await
        .map_err(|e| anyhow!(e))?;

    let review = if pick != 0 {
        workflow_commands::select_candidate(controller, pick)
            .await
            .map_err(|e| anyhow!(e))?;
        // The review returned by identify predates the pick.
        workflow_commands::get_workflow_state(controller)
            .await
            .review
            .unwrap_or(review)
    } else {
        review
    };

    if json && !save {
        return output(true, &review, String::new);
    }
    if !json {
        for (target, candidate) in review.result().iter() {
            let marker = if target.is_primary() { "AI Pick" } else { "" };
            let chosen = if target.position() == pick { "*" } else { " " };
            let watering = candidate
                .water_frequency
                .map(watering_label)
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{chosen} [{}] {} {} ({watering}) {marker}",
                target.position(),
                candidate.name,
                candidate.latin_name.as_deref().unwrap_or(""),
            );
        }
    }

    if save {
        let record = workflow_commands::save_selection(controller)
            .await
            .map_err(|e| anyhow!(e))?;
        output(json, &record, || format!("Saved {} ({})", record.name, record.id))?;
    }
    Ok(())
}

async fn run_plants(state: &AppState, action: PlantCommands, json: bool) -> Result<()> {
    match action {
        PlantCommands::List => {
            let plants = plant_commands::list_plants(state).await.map_err(|e| anyhow!(e))?;
            output(json, &plants, || {
                plants
                    .iter()
                    .map(|plant| format!("{}\t{}", plant.id, plant.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        PlantCommands::Show { id } => {
            let view = plant_commands::get_plant_detail(state, &id)
                .await
                .map_err(|e| anyhow!(e))?;
            output(json, &view, || {
                let mut lines = vec![view.plant.name.clone()];
                if let Some(watering) = &view.watering {
                    lines.push(format!("Water: every {watering}"));
                }
                if let Some(sunlight) = &view.plant.sunlight {
                    lines.push(format!("Sunlight: {sunlight}"));
                }
                if let Some(soil) = &view.plant.soil_type {
                    lines.push(format!("Soil: {soil}"));
                }
                lines.extend(view.care_steps.iter().cloned());
                for progress in &view.progress {
                    let entry = &progress.entry;
                    let condition = entry.condition.as_deref().unwrap_or("-");
                    let when = entry
                        .created_at
                        .map(format_timestamp)
                        .unwrap_or_default();
                    lines.push(format!(
                        "{when}  {}  {condition} ({})",
                        entry.progress_type.as_deref().unwrap_or("-"),
                        condition_style(condition).background
                    ));
                }
                lines.join("\n")
            })
        }
        PlantCommands::Edit {
            id,
            name,
            water_days,
            sunlight,
            soil,
        } => {
            let edit = PlantEdit {
                name,
                water_frequency: water_days,
                sunlight,
                soil_type: soil,
            };
            if edit.is_empty() {
                return Err(anyhow!("nothing to change"));
            }
            plant_commands::update_plant(state, &id, edit)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("Updated plant {id}");
            Ok(())
        }
        PlantCommands::Delete { id } => {
            plant_commands::delete_plant(state, &id)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("Deleted plant {id}");
            Ok(())
        }
    }
}

async fn run_progress(state: &AppState, action: ProgressCommands, json: bool) -> Result<()> {
    match action {
        ProgressCommands::Add {
            plant_id,
            photo,
            notes,
        } => {
            let flow = progress_commands::begin_add_progress(state, &plant_id)
                .await
                .map_err(|e| anyhow!(e))?;
            let controller = progress_commands::open_add_progress(
                state,
                flow,
                Arc::new(StillImageCamera::new(photo)),
            )
            .await
            .map_err(|e| anyhow!(e))?;

            let outcome: Result<Option<ProgressEntry>> = async {
                if let CameraAccess::PermissionRequired(status) =
                    progress_commands::progress_camera(&controller).await
                {
                    return Err(anyhow!("camera permission {status:?}"));
                }
                progress_commands::capture_progress_photo(&controller)
                    .await
                    .map_err(|e| anyhow!(e))?;
                progress_commands::submit_progress(&controller, &notes)
                    .await
                    .map_err(|e| anyhow!(e))
            }
            .await;
            progress_commands::close_add_progress(&controller).await;

            let entry = outcome?;
            output(json, &entry, || match &entry {
                Some(entry) => format!(
                    "Progress recorded: {} / {}",
                    entry.progress_type.as_deref().unwrap_or("-"),
                    entry.condition.as_deref().unwrap_or("-")
                ),
                None => "Progress recorded".to_string(),
            })
        }
    }
}

fn run_config(action: &ConfigCommands, data_dir: &std::path::Path, json: bool) -> Result<()> {
    let store = crate::settings::SettingsStore::in_dir(data_dir)?;
    match action {
        ConfigCommands::Show => {
            let settings = store.get();
            output(json, &settings, || {
                serde_json::to_string_pretty(&settings).unwrap_or_default()
            })
        }
        ConfigCommands::SetBaseUrl { url } => {
            let url = crate::settings::resolve_base_url(Some(url.clone()), None)?;
            store.update(|settings| settings.base_url = Some(url.clone()))?;
            println!("Base URL set to {url}");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct OptionsListing {
    watering: Vec<(u32, &'static str)>,
    sunlight: Vec<&'static str>,
    soil: Vec<&'static str>,
}

fn print_options(json: bool) -> Result<()> {
    let listing = OptionsListing {
        watering: WATERING_OPTIONS.iter().map(|o| (o.value, o.label)).collect(),
        sunlight: SUNLIGHT_OPTIONS.iter().map(|o| o.value).collect(),
        soil: SOIL_OPTIONS.iter().map(|o| o.value).collect(),
    };
    output(json, &listing, || {
        format!(
            "Watering: {}\nSunlight: {}\nSoil: {}",
            listing
                .watering
                .iter()
                .map(|(_, label)| *label)
                .collect::<Vec<_>>()
                .join(", "),
            listing.sunlight.join(", "),
            listing.soil.join(", ")
        )
    })
}

fn output<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        let text = text();
        if !text.is_empty() {
            println!("{text}");
        }
    }
    Ok(())
}
