//! Assistant shell: startup gate, greeting, and the conversation loop.

use std::time::Duration;

use chrono::{Local, Timelike};
use tracing::info;

use crate::capability::CapabilityTable;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::features::Providers;
use crate::platform::PlatformInventory;

pub struct Assistant {
    config: Config,
    providers: Providers,
    inventory: PlatformInventory,
    dispatcher: Dispatcher,
}

impl Assistant {
    pub fn new(
        config: Config,
        providers: Providers,
        inventory: PlatformInventory,
        capabilities: CapabilityTable,
    ) -> Self {
        let dispatcher = Dispatcher::new(&config, inventory.profile(), capabilities);
        Self {
            config,
            providers,
            inventory,
            dispatcher,
        }
    }

    /// Run until the farewell intent fires. Refuses to start when required
    /// capabilities are missing or the microphone check fails.
    pub fn run(&mut self) -> Result<(), AppError> {
        let missing = self.dispatcher.capabilities().missing_required();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
            return Err(AppError::MissingDependencies(names.join(", ")));
        }

        if !self.providers.speech.verify_microphone() {
            return Err(AppError::Microphone(
                "microphone not functioning properly; check your input settings and restart"
                    .into(),
            ));
        }

        self.greet();

        let timeout = Duration::from_secs_f64(self.config.speech.listen_timeout);
        let phrase_limit = Duration::from_secs_f64(self.config.speech.phrase_limit);

        loop {
            match self.providers.speech.listen(timeout, phrase_limit) {
                Some(command) => {
                    if !self
                        .dispatcher
                        .process_command(&command, &self.providers, &mut self.inventory)
                    {
                        break;
                    }
                }
                None => {
                    if self.providers.speech.closed() {
                        info!("Input stream closed");
                        break;
                    }
                }
            }
        }

        info!(
            "Session ended after {} recorded turn(s)",
            self.dispatcher.history().len()
        );
        Ok(())
    }

    /// Time-of-day greeting.
    fn greet(&self) {
        let now = Local::now();
        let time_str = now.format("%I:%M %p");
        let greeting = match now.hour() {
            0..=11 => format!("Good Morning! It's {time_str}"),
            12..=15 => format!("Good Afternoon! It's {time_str}"),
            16..=19 => format!("Good Evening! It's {time_str}"),
            _ => format!("Hello! It's {time_str}"),
        };
        self.providers.speech.speak(&format!(
            "{greeting}. I am {}, how may I assist you?",
            self.config.assistant.name
        ));
    }
}
