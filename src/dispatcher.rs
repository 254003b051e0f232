//! Command dispatch: sanitize, match ordered intent rules, invoke features.
//!
//! Rules are evaluated first-match in a fixed priority order; triggers are
//! plain substring containment tests on the normalized text, so ordering
//! encodes priority. Keyword stripping is token-by-token: a trigger word is
//! removed wherever it occurs, and whatever remains becomes the action's
//! free-text argument.

use tracing::{debug, warn};

use crate::capability::{Capability, CapabilityTable};
use crate::config::Config;
use crate::features::Providers;
use crate::history::{ConversationLog, Speaker};
use crate::platform::{PlatformInventory, PlatformProfile};

/// Characters that could reach a downstream shell invocation.
const DISALLOWED_CHARS: &[char] = &[
    '`', '$', '(', ')', '{', '}', '[', ']', '&', '|', ';', '\\',
];

const CONFIRM_PHRASE: &str = "confirm shutdown";

#[derive(Debug, Clone, Copy)]
enum Trigger {
    AnyOf(&'static [&'static str]),
    AllOf(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::AnyOf(words) => words.iter().any(|word| text.contains(word)),
            Self::AllOf(words) => words.iter().all(|word| text.contains(word)),
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::AnyOf(words) | Self::AllOf(words) => words,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Farewell,
    OpenYoutube,
    PlayMedia,
    WebSearch,
    CancelShutdown,
    Shutdown,
    Restart,
    Sleep,
    OpenEditor,
    Weather,
    News,
    WhereAmI,
    WikiSearch,
    Screenshot,
    InstagramLookup,
}

struct IntentRule {
    trigger: Trigger,
    capability: Option<Capability>,
    action: Action,
}

/// Static rule set; ordering encodes priority. "cancel shutdown" must stay
/// above "shutdown" so cancellation is never mistaken for a shutdown request.
const RULES: &[IntentRule] = &[
    IntentRule {
        trigger: Trigger::AnyOf(&["goodbye", "bye"]),
        capability: None,
        action: Action::Farewell,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["open youtube"]),
        capability: Some(Capability::Browser),
        action: Action::OpenYoutube,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["play"]),
        capability: Some(Capability::Browser),
        action: Action::PlayMedia,
    },
    IntentRule {
        trigger: Trigger::AllOf(&["search", "google"]),
        capability: Some(Capability::Browser),
        action: Action::WebSearch,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["cancel shutdown"]),
        capability: None,
        action: Action::CancelShutdown,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["shutdown"]),
        capability: None,
        action: Action::Shutdown,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["restart"]),
        capability: None,
        action: Action::Restart,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["sleep"]),
        capability: None,
        action: Action::Sleep,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["notepad", "text editor"]),
        capability: None,
        action: Action::OpenEditor,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["weather"]),
        capability: Some(Capability::Weather),
        action: Action::Weather,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["news"]),
        capability: Some(Capability::News),
        action: Action::News,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["where am i"]),
        capability: None,
        action: Action::WhereAmI,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["wikipedia"]),
        capability: Some(Capability::Wiki),
        action: Action::WikiSearch,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["screenshot", "take ss"]),
        capability: Some(Capability::Screenshot),
        action: Action::Screenshot,
    },
    IntentRule {
        trigger: Trigger::AnyOf(&["instagram"]),
        capability: Some(Capability::Social),
        action: Action::InstagramLookup,
    },
];

/// Remove every occurrence of the trigger words, token by token.
fn strip_keywords(text: &str, keywords: &[&str]) -> String {
    let tokens: Vec<&str> = keywords
        .iter()
        .flat_map(|keyword| keyword.split_whitespace())
        .collect();
    text.split_whitespace()
        .filter(|word| !tokens.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Dispatcher {
    capabilities: CapabilityTable,
    history: ConversationLog,
    default_city: String,
    editor_name: &'static str,
}

impl Dispatcher {
    pub fn new(config: &Config, profile: PlatformProfile, capabilities: CapabilityTable) -> Self {
        let editor_name = match profile {
            PlatformProfile::Windows => "notepad",
            PlatformProfile::MacOs => "textedit",
            PlatformProfile::Linux | PlatformProfile::Other => "gedit",
        };
        Self {
            capabilities,
            history: ConversationLog::new(),
            default_city: config.weather.default_city.clone(),
            editor_name,
        }
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn history(&self) -> &ConversationLog {
        &self.history
    }

    /// Process one command. Returns `false` only for the farewell rule,
    /// signaling the caller's loop to stop.
    pub fn process_command(
        &mut self,
        raw: &str,
        providers: &Providers,
        inventory: &mut PlatformInventory,
    ) -> bool {
        let command = raw.trim().to_lowercase();
        if command.is_empty() {
            return true;
        }

        if command.chars().any(|c| DISALLOWED_CHARS.contains(&c)) {
            debug!("Rejected command containing disallowed characters");
            self.respond(
                providers,
                "I'm sorry, that command contains characters I can't process.",
            );
            return true;
        }

        self.history.append(Speaker::User, &command);

        let Some(rule) = RULES.iter().find(|rule| rule.trigger.matches(&command)) else {
            let response = providers.responder.respond(&command);
            self.respond(providers, &response);
            return true;
        };

        if let Some(capability) = rule.capability {
            if !self.capabilities.is_available(capability) {
                self.respond(
                    providers,
                    &format!(
                        "I'm sorry, {} features are unavailable due to missing dependencies.",
                        capability.feature_name()
                    ),
                );
                return true;
            }
        }

        let args = strip_keywords(&command, rule.trigger.keywords());
        self.execute(rule.action, &command, &args, providers, inventory)
    }

    fn respond(&mut self, providers: &Providers, text: &str) {
        providers.speech.speak(text);
        self.history.append(Speaker::Assistant, text);
    }

    fn execute(
        &mut self,
        action: Action,
        command: &str,
        args: &str,
        providers: &Providers,
        inventory: &mut PlatformInventory,
    ) -> bool {
        match action {
            Action::Farewell => {
                self.respond(providers, "Goodbye! Have a great day!");
                return false;
            }
            Action::OpenYoutube => {
                providers.browser.open_url("youtube.com");
                self.respond(providers, "Opening YouTube.");
            }
            Action::PlayMedia => {
                if args.is_empty() {
                    self.respond(providers, "What would you like me to play?");
                } else {
                    providers.browser.search_video(args);
                    self.respond(providers, &format!("Playing {args} on YouTube."));
                }
            }
            Action::WebSearch => {
                if args.is_empty() {
                    self.respond(providers, "What should I search for?");
                } else {
                    providers.browser.search_web(args);
                    self.respond(providers, &format!("Searching Google for {args}."));
                }
            }
            Action::CancelShutdown => {
                let message = providers.power.cancel_shutdown();
                self.respond(providers, &message);
            }
            Action::Shutdown => {
                // two-step guard: only an utterance carrying the confirmation
                // phrase reaches the OS
                let confirmed = command.contains(CONFIRM_PHRASE);
                let message = providers.power.request_shutdown(confirmed);
                self.respond(providers, &message);
            }
            Action::Restart => {
                self.respond(providers, "Restarting your computer.");
                providers.power.restart();
            }
            Action::Sleep => {
                self.respond(providers, "Putting the computer to sleep.");
                providers.power.sleep();
            }
            Action::OpenEditor => match inventory.find_application(self.editor_name) {
                Some(path) => {
                    providers.power.open_application(&path);
                    self.respond(providers, &format!("Opening {}.", self.editor_name));
                }
                None => {
                    self.respond(
                        providers,
                        &format!("I couldn't find {} on this computer.", self.editor_name),
                    );
                }
            },
            Action::Weather => {
                let report = providers.weather.get_weather(&self.default_city);
                self.respond(providers, &report);
            }
            Action::News => {
                self.respond(providers, "Here are today's top headlines:");
                for (i, headline) in providers.news.headlines().iter().enumerate() {
                    self.respond(providers, &format!("Headline {}: {headline}", i + 1));
                }
            }
            Action::WhereAmI => match providers.location.current_location() {
                Ok(location) => {
                    self.respond(
                        providers,
                        &format!(
                            "You are in {}, {}, {}",
                            location.city, location.region, location.country
                        ),
                    );
                }
                Err(e) => {
                    warn!("Location lookup failed: {e}");
                    self.respond(providers, "I couldn't work out where you are right now.");
                }
            },
            Action::WikiSearch => {
                if args.is_empty() {
                    self.respond(providers, "What should I look up on Wikipedia?");
                } else {
                    self.respond(providers, "According to Wikipedia");
                    let summary = providers.wiki.summarize(args, 2);
                    self.respond(providers, &summary);
                }
            }
            Action::Screenshot => {
                self.respond(providers, "Taking screenshot");
                match providers.screenshot.capture(None) {
                    Ok(path) => {
                        self.respond(
                            providers,
                            &format!("Screenshot saved to {}", path.display()),
                        );
                    }
                    Err(e) => {
                        self.respond(providers, &format!("Error taking screenshot: {e}"));
                    }
                }
            }
            Action::InstagramLookup => match args.split_whitespace().next() {
                Some(username) => {
                    let url = providers.social.profile_url(username);
                    self.respond(providers, &format!("Here is that profile: {url}"));
                }
                None => {
                    self.respond(providers, "Whose Instagram profile should I look up?");
                }
            },
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::table_with;
    use crate::features::{
        browser::Browser, location::Location, location::LocationProvider, news::NewsProvider,
        power::PowerControl, screenshot::ScreenshotProvider, social::SocialProvider,
        weather::WeatherProvider, wiki::WikiProvider,
    };
    use crate::responder::{Responder, SentimentClassifier};
    use crate::speech::SpeechIo;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use std::time::Duration;

    type Calls = Rc<RefCell<Vec<String>>>;

    struct MockSpeech {
        spoken: Calls,
    }

    impl SpeechIo for MockSpeech {
        fn probe(&self) -> bool {
            true
        }
        fn verify_microphone(&self) -> bool {
            true
        }
        fn speak(&self, text: &str) {
            self.spoken.borrow_mut().push(text.to_string());
        }
        fn listen(&self, _timeout: Duration, _phrase_limit: Duration) -> Option<String> {
            None
        }
    }

    struct MockBrowser {
        calls: Calls,
    }

    impl Browser for MockBrowser {
        fn probe(&self) -> bool {
            true
        }
        fn open_url(&self, url: &str) {
            self.calls.borrow_mut().push(format!("open:{url}"));
        }
        fn search_video(&self, query: &str) {
            self.calls.borrow_mut().push(format!("video:{query}"));
        }
        fn search_web(&self, query: &str) {
            self.calls.borrow_mut().push(format!("web:{query}"));
        }
    }

    struct MockWeather {
        calls: Calls,
    }

    impl WeatherProvider for MockWeather {
        fn probe(&self) -> bool {
            true
        }
        fn get_weather(&self, city: &str) -> String {
            self.calls.borrow_mut().push(format!("weather:{city}"));
            format!("The temperature in {city} is 12 degrees Celsius with light rain")
        }
    }

    struct MockNews;

    impl NewsProvider for MockNews {
        fn probe(&self) -> bool {
            true
        }
        fn headlines(&self) -> Vec<String> {
            vec!["Rust 2.0 announced".into(), "Ferris spotted".into()]
        }
    }

    struct MockWiki;

    impl WikiProvider for MockWiki {
        fn probe(&self) -> bool {
            true
        }
        fn summarize(&self, query: &str, _sentences: usize) -> String {
            format!("Summary of {query}.")
        }
    }

    struct MockLocation;

    impl LocationProvider for MockLocation {
        fn current_location(&self) -> Result<Location, String> {
            Ok(Location {
                city: "London".into(),
                region: "England".into(),
                country: "United Kingdom".into(),
            })
        }
    }

    struct MockSocial;

    impl SocialProvider for MockSocial {
        fn probe(&self) -> bool {
            true
        }
        fn profile_url(&self, username: &str) -> String {
            format!("https://www.instagram.com/{username}")
        }
    }

    struct MockScreenshot;

    impl ScreenshotProvider for MockScreenshot {
        fn probe(&self) -> bool {
            true
        }
        fn capture(&self, _name: Option<&str>) -> Result<PathBuf, String> {
            Ok(PathBuf::from("/tmp/shot.png"))
        }
    }

    struct MockPower {
        calls: Calls,
    }

    impl PowerControl for MockPower {
        fn request_shutdown(&self, confirmed: bool) -> String {
            self.calls.borrow_mut().push(format!("shutdown:{confirmed}"));
            if confirmed {
                "Shutting down in one minute. To cancel, say 'cancel shutdown'".into()
            } else {
                "Please confirm by saying 'confirm shutdown'".into()
            }
        }
        fn cancel_shutdown(&self) -> String {
            self.calls.borrow_mut().push("cancel".into());
            "Shutdown canceled".into()
        }
        fn restart(&self) {
            self.calls.borrow_mut().push("restart".into());
        }
        fn sleep(&self) {
            self.calls.borrow_mut().push("sleep".into());
        }
        fn open_application(&self, path: &Path) {
            self.calls.borrow_mut().push(format!("app:{}", path.display()));
        }
        fn close_application(&self, name: &str) {
            self.calls.borrow_mut().push(format!("close:{name}"));
        }
    }

    struct Handles {
        spoken: Calls,
        browser: Calls,
        weather: Calls,
        power: Calls,
    }

    fn mock_providers() -> (Providers, Handles) {
        let handles = Handles {
            spoken: Calls::default(),
            browser: Calls::default(),
            weather: Calls::default(),
            power: Calls::default(),
        };
        let providers = Providers {
            speech: Box::new(MockSpeech {
                spoken: handles.spoken.clone(),
            }),
            browser: Box::new(MockBrowser {
                calls: handles.browser.clone(),
            }),
            weather: Box::new(MockWeather {
                calls: handles.weather.clone(),
            }),
            news: Box::new(MockNews),
            wiki: Box::new(MockWiki),
            location: Box::new(MockLocation),
            social: Box::new(MockSocial),
            screenshot: Box::new(MockScreenshot),
            power: Box::new(MockPower {
                calls: handles.power.clone(),
            }),
            responder: Responder::new(SentimentClassifier::Neutral),
        };
        (providers, handles)
    }

    fn dispatcher(capabilities: CapabilityTable) -> (Dispatcher, PlatformInventory) {
        let config = Config::default();
        let inventory = PlatformInventory::with_roots(
            PlatformProfile::Linux,
            vec![],
            1,
            Duration::from_secs(1),
        );
        (
            Dispatcher::new(&config, PlatformProfile::Linux, capabilities),
            inventory,
        )
    }

    fn all_available() -> CapabilityTable {
        table_with(&Capability::ALL)
    }

    #[test]
    fn disallowed_characters_get_clarification_and_no_action() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        let cont = dispatcher.process_command("play $(rm -rf /)", &providers, &mut inventory);

        assert!(cont);
        assert!(handles.browser.borrow().is_empty());
        assert!(handles.power.borrow().is_empty());
        let spoken = handles.spoken.borrow();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("characters I can't process"));
    }

    #[test]
    fn empty_input_is_a_silent_no_op() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("   ", &providers, &mut inventory));
        assert!(handles.spoken.borrow().is_empty());
        assert!(dispatcher.history().is_empty());
    }

    #[test]
    fn farewell_stops_the_loop_with_one_assistant_turn() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        let cont = dispatcher.process_command("goodbye friday", &providers, &mut inventory);

        assert!(!cont);
        assert_eq!(handles.spoken.borrow().len(), 1);
        let turns: Vec<_> = dispatcher.history().iter().collect();
        assert_eq!(turns.len(), 2); // user turn + one farewell
        assert_eq!(turns[1].speaker, Speaker::Assistant);
        assert!(turns[1].text.contains("Goodbye"));
    }

    #[test]
    fn play_strips_trigger_and_queries_video() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("play lofi hip hop radio", &providers, &mut inventory));
        assert_eq!(
            handles.browser.borrow().as_slice(),
            ["video:lofi hip hop radio"]
        );
    }

    #[test]
    fn search_google_strips_both_tokens_anywhere() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command(
            "search google for rust programming",
            &providers,
            &mut inventory
        ));
        assert_eq!(
            handles.browser.borrow().as_slice(),
            ["web:for rust programming"]
        );
    }

    #[test]
    fn google_search_with_interleaved_tokens() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("google search borrow checker", &providers, &mut inventory));
        assert_eq!(handles.browser.borrow().as_slice(), ["web:borrow checker"]);
    }

    #[test]
    fn shutdown_without_confirmation_never_reaches_the_os() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("shutdown the computer", &providers, &mut inventory));

        let power = handles.power.borrow();
        assert_eq!(power.as_slice(), ["shutdown:false"]);
        let spoken = handles.spoken.borrow();
        assert!(spoken[0].contains("confirm shutdown"));
    }

    #[test]
    fn confirmed_shutdown_executes() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("confirm shutdown", &providers, &mut inventory));
        assert_eq!(handles.power.borrow().as_slice(), ["shutdown:true"]);
    }

    #[test]
    fn cancel_shutdown_is_unconditional_and_not_a_shutdown() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("cancel shutdown", &providers, &mut inventory));
        assert_eq!(handles.power.borrow().as_slice(), ["cancel"]);
    }

    #[test]
    fn unavailable_weather_gives_fixed_message_and_skips_provider() {
        let (providers, handles) = mock_providers();
        let available: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(|c| *c != Capability::Weather)
            .collect();
        let (mut dispatcher, mut inventory) = dispatcher(table_with(&available));

        assert!(dispatcher.process_command("what's the weather like", &providers, &mut inventory));

        assert!(handles.weather.borrow().is_empty());
        let spoken = handles.spoken.borrow();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("unavailable due to missing dependencies"));
    }

    #[test]
    fn weather_uses_the_default_city() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("how is the weather today", &providers, &mut inventory));
        assert_eq!(handles.weather.borrow().as_slice(), ["weather:London"]);
    }

    #[test]
    fn news_reads_numbered_headlines() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("tell me the news", &providers, &mut inventory));
        let spoken = handles.spoken.borrow();
        assert_eq!(spoken[0], "Here are today's top headlines:");
        assert_eq!(spoken[1], "Headline 1: Rust 2.0 announced");
        assert_eq!(spoken[2], "Headline 2: Ferris spotted");
    }

    #[test]
    fn unmatched_command_falls_through_to_responder() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("how are you doing", &providers, &mut inventory));
        let spoken = handles.spoken.borrow();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("here to help"));
    }

    #[test]
    fn editor_routes_through_the_application_index() {
        let dir = tempfile::tempdir().unwrap();
        let editor = dir.path().join("gedit");
        std::fs::write(&editor, b"").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&editor).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&editor, perms).unwrap();
        }

        let (providers, handles) = mock_providers();
        let config = Config::default();
        let mut dispatcher =
            Dispatcher::new(&config, PlatformProfile::Linux, all_available());
        let mut inventory = PlatformInventory::with_roots(
            PlatformProfile::Linux,
            vec![dir.path().to_path_buf()],
            1,
            Duration::from_secs(5),
        );

        assert!(dispatcher.process_command("open the text editor", &providers, &mut inventory));
        let power = handles.power.borrow();
        assert_eq!(power.len(), 1);
        assert!(power[0].starts_with("app:"));
        assert!(power[0].ends_with("gedit"));
    }

    #[test]
    fn missing_editor_gets_a_spoken_miss() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("open notepad please", &providers, &mut inventory));
        assert!(handles.power.borrow().is_empty());
        assert!(handles.spoken.borrow()[0].contains("couldn't find"));
    }

    #[test]
    fn instagram_lookup_uses_first_remaining_token() {
        let (providers, handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        assert!(dispatcher.process_command("instagram nasa", &providers, &mut inventory));
        let spoken = handles.spoken.borrow();
        assert!(spoken[0].contains("https://www.instagram.com/nasa"));
        drop(spoken);
        assert!(handles.browser.borrow().is_empty());
    }

    #[test]
    fn history_records_both_speakers() {
        let (providers, _handles) = mock_providers();
        let (mut dispatcher, mut inventory) = dispatcher(all_available());

        dispatcher.process_command("what is the weather", &providers, &mut inventory);

        let turns: Vec<_> = dispatcher.history().iter().collect();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::User);
        assert_eq!(turns[0].text, "what is the weather");
        assert_eq!(turns[1].speaker, Speaker::Assistant);
    }

    #[test]
    fn strip_keywords_removes_tokens_not_substrings() {
        assert_eq!(strip_keywords("play playground tour", &["play"]), "playground tour");
        assert_eq!(
            strip_keywords("search for google search tips", &["search", "google"]),
            "for tips"
        );
    }
}
