//! Interactive menu loop.
//!
//! Presentation only: renders the numbered menu, dispatches to the
//! lifecycle controller, and decides what an error means for the session.
//! Operation failures are reported and the menu continues; only the
//! privilege check (done before this loop starts) terminates the process.

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::LifecycleError;
use crate::lifecycle::LifecycleController;
use crate::prompt::Prompter;

/// One menu action, parsed from operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Install,
    Update,
    EditConfig,
    Start,
    Stop,
    Restart,
    Logs,
    Status,
    Remove,
    Exit,
}

/// Parse a menu selection. Accepts the item number only.
#[must_use]
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Install),
        "2" => Some(MenuChoice::Update),
        "3" => Some(MenuChoice::EditConfig),
        "4" => Some(MenuChoice::Start),
        "5" => Some(MenuChoice::Stop),
        "6" => Some(MenuChoice::Restart),
        "7" => Some(MenuChoice::Logs),
        "8" => Some(MenuChoice::Status),
        "9" => Some(MenuChoice::Remove),
        "10" | "0" | "q" => Some(MenuChoice::Exit),
        _ => None,
    }
}

const MENU_ITEMS: &[&str] = &[
    " 1) Install / Reinstall",
    " 2) Update",
    " 3) Edit config",
    " 4) Start",
    " 5) Stop",
    " 6) Restart",
    " 7) View logs",
    " 8) Status",
    " 9) Uninstall",
    "10) Exit",
];

/// Run the menu loop until the operator selects Exit.
///
/// # Errors
///
/// Returns an error only for terminal-level failures (input stream gone);
/// operation failures are reported and the loop continues.
pub async fn run(app: &AppContext, prompter: &mut dyn Prompter) -> Result<()> {
    let controller = LifecycleController::new(&app.descriptor, &app.runner, &app.output);

    loop {
        let state = controller.state().await;
        app.output.blank();
        app.output
            .header(&format!("botctl - {} deployment manager", app.descriptor.name));
        app.output.kv("state     ", state.display());
        app.output.blank();
        if !app.output.quiet {
            for item in MENU_ITEMS {
                println!("  {item}");
            }
        }
        app.output.blank();

        let raw = prompter.ask("Select an option")?;
        let Some(choice) = parse_choice(&raw) else {
            app.output.warn("Enter a number between 1 and 10.");
            continue;
        };

        let result = match choice {
            MenuChoice::Install => controller.install(prompter).await,
            MenuChoice::Update => controller.update().await,
            MenuChoice::EditConfig => controller.edit_config().await,
            MenuChoice::Start => controller.start().await,
            MenuChoice::Stop => controller.stop().await,
            MenuChoice::Restart => controller.restart().await,
            MenuChoice::Logs => controller.logs().await,
            MenuChoice::Status => controller.status().await,
            MenuChoice::Remove => controller.remove(prompter).await,
            MenuChoice::Exit => return Ok(()),
        };

        if let Err(e) = result {
            match e.downcast_ref::<LifecycleError>() {
                Some(err) if err.is_cancellation() => app.output.info(&err.to_string()),
                _ => app.output.error(&format!("{e:#}")),
            }
        }
    }
}
