//! Terminal front end
//!
//! Every screen change goes through [`routes::resolve_for`], so the shell
//! never shows a page the current credential may not open.

use std::io::Write;

use anyhow::Result;
use auth::Credentials;
use chat::{
    Deletion, Message, RejectReason, SUGGESTIONS, Sender, SessionId, SubmitOutcome, VoiceOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::routes::{self, Route, View};
use crate::state::AppState;
use crate::theme::Theme;

const HELP: &str = "\
Commands:
  <text>          ask a question (an empty line sends the voice draft)
  /new            start a new chat
  /list           list chats
  /switch <n>     open chat n
  /delete [n]     delete chat n (default: the open chat)
  /rename <title> rename the open chat
  /suggest [n]    show suggested questions, or ask suggestion n
  /voice          dictate a question into the draft
  /history        show the server's conversation history
  /reset          clear the server's conversation history
  /go <path>      open /chat, /curriculum, /admin, /login or /signup
  /theme          switch between light and dark
  /logout         sign out
  /quit           exit";

/// Where to go after a screen finishes
enum Next {
    Go(String),
    Quit,
}

pub struct Shell {
    state: AppState,
    input: Lines<BufReader<Stdin>>,
    draft: Option<String>,
}

impl Shell {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            input: BufReader::new(tokio::io::stdin()).lines(),
            draft: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut path = Route::Chat.path().to_string();
        println!("Department chat client ({})", self.state.config.api_base_url);

        loop {
            let view = {
                let gate = self.state.engine.auth().lock().await;
                routes::resolve_for(&gate, &path)
            };

            let next = match view {
                View::Redirect(route) => Next::Go(route.path().to_string()),
                View::Forbidden => forbidden_page(),
                View::Page(Route::Login) => self.login_page().await?,
                View::Page(Route::Signup) => self.signup_page().await?,
                View::Page(Route::Chat) => self.chat_page().await?,
                View::Page(route @ (Route::Curriculum | Route::Admin)) => {
                    self.placeholder_page(route).await?
                }
            };

            match next {
                Next::Go(target) => path = target,
                Next::Quit => return Ok(()),
            }
        }
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        std::io::stdout().flush()?;
        Ok(self.input.next_line().await?)
    }

    fn theme(&self) -> Theme {
        self.state.theme.current()
    }

    async fn login_page(&mut self) -> Result<Next> {
        println!("\n== Log in ==  (/signup to create an account, /quit to exit)");

        let Some(email) = self.prompt("Email: ").await? else {
            return Ok(Next::Quit);
        };
        match email.trim() {
            "/quit" => return Ok(Next::Quit),
            "/signup" => return Ok(Next::Go(Route::Signup.path().to_string())),
            _ => {}
        }
        let Some(password) = self.prompt("Password: ").await? else {
            return Ok(Next::Quit);
        };

        let credentials = Credentials::new(email, password);
        match self.state.auth_client.login(&credentials).await {
            Ok(token) => Ok(self.accept_token(token).await),
            Err(e) => {
                println!("{}", e);
                Ok(Next::Go(Route::Login.path().to_string()))
            }
        }
    }

    /// Hold a freshly issued credential; back to the login page if it cannot be kept
    async fn accept_token(&self, token: String) -> Next {
        let mut gate = self.state.engine.auth().lock().await;
        if let Err(e) = gate.login(token).await {
            println!("Could not save your sign-in: {}", e);
            return Next::Go(Route::Login.path().to_string());
        }
        match gate.subject() {
            Some(subject) => println!("Signed in as {}.", subject),
            None => println!("Signed in."),
        }
        Next::Go(Route::Chat.path().to_string())
    }

    async fn signup_page(&mut self) -> Result<Next> {
        println!("\n== Create a student account ==  (/login to go back, /quit to exit)");

        let Some(email) = self.prompt("Email: ").await? else {
            return Ok(Next::Quit);
        };
        match email.trim() {
            "/quit" => return Ok(Next::Quit),
            "/login" => return Ok(Next::Go(Route::Login.path().to_string())),
            _ => {}
        }
        let Some(password) = self.prompt("Password: ").await? else {
            return Ok(Next::Quit);
        };

        match self
            .state
            .auth_client
            .register(&Credentials::new(email, password))
            .await
        {
            Ok(created) => {
                if !created.message.is_empty() {
                    println!("{}", created.message);
                }
                println!("Account created. Please log in.");
                Ok(Next::Go(Route::Login.path().to_string()))
            }
            Err(e) => {
                println!("{}", e);
                Ok(Next::Go(Route::Signup.path().to_string()))
            }
        }
    }

    async fn placeholder_page(&mut self, route: Route) -> Result<Next> {
        match route {
            Route::Admin => println!("\n== Admin dashboard =="),
            _ => println!("\n== Curriculum =="),
        }
        println!("This screen is managed in the web dashboard.");
        self.wait_for_navigation().await
    }

    async fn wait_for_navigation(&mut self) -> Result<Next> {
        loop {
            let Some(line) = self.prompt("(/go <path>, /quit) > ").await? else {
                return Ok(Next::Quit);
            };
            let line = line.trim();
            if line == "/quit" {
                return Ok(Next::Quit);
            }
            if let Some(path) = line.strip_prefix("/go") {
                return Ok(Next::Go(path.trim().to_string()));
            }
        }
    }

    async fn chat_page(&mut self) -> Result<Next> {
        println!("\n== Department Assistant ==  (/help for commands)");
        self.print_transcript().await;

        loop {
            let Some(line) = self.prompt("> ").await? else {
                return Ok(Next::Quit);
            };
            let line = line.trim().to_string();

            if !line.starts_with('/') {
                let text = match (line.is_empty(), self.draft.take()) {
                    (true, Some(draft)) => draft,
                    (_, _) => line,
                };
                if let Some(next) = self.ask(&text).await {
                    return Ok(next);
                }
                continue;
            }

            let (command, argument) = match line.split_once(char::is_whitespace) {
                Some((command, argument)) => (command, argument.trim()),
                None => (line.as_str(), ""),
            };

            match command {
                "/help" => println!("{}", HELP),
                "/quit" => return Ok(Next::Quit),
                "/go" => return Ok(Next::Go(argument.to_string())),
                "/logout" => return Ok(self.logout().await),
                "/new" => self.new_session().await,
                "/list" => self.list_sessions().await,
                "/switch" => self.switch_session(argument).await,
                "/delete" => self.delete_session(argument).await?,
                "/rename" => {
                    let mut sessions = self.state.engine.sessions().lock().await;
                    let id = sessions.active_id().clone();
                    match sessions.rename_session(&id, argument).await {
                        Ok(()) => println!("Renamed to \"{}\".", argument),
                        Err(e) => println!("{}", e),
                    }
                }
                "/suggest" => {
                    if argument.is_empty() {
                        for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
                            println!("  {}. {}", i + 1, suggestion);
                        }
                    } else {
                        match pick(argument, SUGGESTIONS.len()) {
                            Some(index) => {
                                println!("> {}", SUGGESTIONS[index]);
                                if let Some(next) = self.ask(SUGGESTIONS[index]).await {
                                    return Ok(next);
                                }
                            }
                            None => println!("No suggestion {}.", argument),
                        }
                    }
                }
                "/voice" => self.capture_voice().await,
                "/history" => self.show_server_history().await,
                "/reset" => self.reset_server_history().await,
                "/theme" => match self.state.theme.toggle().await {
                    Ok(theme) => println!("Theme: {}", theme.as_str()),
                    Err(e) => println!("Could not save the theme: {}", e),
                },
                _ => println!("Unknown command {}. Type /help for commands.", command),
            }
        }
    }

    /// Submit a question; `Some` when the exchange forces navigation
    async fn ask(&mut self, text: &str) -> Option<Next> {
        let signed_in = self.signed_in().await;
        let outcome = self.state.engine.submit(text).await;
        match outcome {
            Ok(SubmitOutcome::Rejected(RejectReason::Blank)) => None,
            Ok(SubmitOutcome::Rejected(RejectReason::InFlight)) => {
                println!("Still waiting for the previous reply.");
                None
            }
            Ok(SubmitOutcome::Replied(_) | SubmitOutcome::Failed(_)) => {
                self.print_last_reply().await;
                None
            }
            Ok(SubmitOutcome::ReauthRequired) => {
                self.print_last_reply().await;
                Some(Next::Go(Route::Login.path().to_string()))
            }
            Err(e) => {
                println!("Could not save the conversation: {}", e);
                // a refused credential is dropped even when the transcript is not written
                let signed_out = signed_in && !self.signed_in().await;
                signed_out.then(|| Next::Go(Route::Login.path().to_string()))
            }
        }
    }

    async fn signed_in(&self) -> bool {
        self.state.engine.auth().lock().await.is_authenticated()
    }

    /// Sign out; the gate forgets the credential even if the stored copy remains
    async fn logout(&self) -> Next {
        match self.state.engine.auth().lock().await.logout().await {
            Ok(()) => println!("Signed out."),
            Err(e) => println!("Signed out, but the saved sign-in could not be removed: {}", e),
        }
        Next::Go(Route::Login.path().to_string())
    }

    async fn new_session(&self) {
        let created = self
            .state
            .engine
            .sessions()
            .lock()
            .await
            .create_session()
            .await;
        match created {
            Ok(_) => {
                self.reset_server_history().await;
                self.print_transcript().await;
            }
            Err(e) => println!("Could not start a new chat: {}", e),
        }
    }

    async fn print_last_reply(&self) {
        let sessions = self.state.engine.sessions().lock().await;
        if let Some(message) = sessions.active().and_then(|s| s.messages.last()) {
            print_message(self.theme(), message);
        }
    }

    async fn print_transcript(&self) {
        let sessions = self.state.engine.sessions().lock().await;
        let Some(session) = sessions.active() else {
            return;
        };

        println!("-- {} --", session.title);
        if session.messages.is_empty() {
            println!("Ask a question, or try one of these (/suggest <n>):");
            for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
                println!("  {}. {}", i + 1, suggestion);
            }
        }
        for message in &session.messages {
            print_message(self.theme(), message);
        }
    }

    async fn list_sessions(&self) {
        let sessions = self.state.engine.sessions().lock().await;
        for (i, session) in sessions.sessions().iter().enumerate() {
            let marker = if &session.id == sessions.active_id() {
                "*"
            } else {
                " "
            };
            println!(
                "{} {}. {} ({} messages)",
                marker,
                i + 1,
                session.title,
                session.messages.len()
            );
        }
    }

    async fn switch_session(&self, argument: &str) {
        {
            let mut sessions = self.state.engine.sessions().lock().await;
            let Some(index) = pick(argument, sessions.len()) else {
                println!("No chat {}. Use /list to see chats.", argument);
                return;
            };
            let id = sessions.sessions()[index].id.clone();
            if let Err(e) = sessions.select_session(&id).await {
                println!("Could not open chat {}: {}", argument, e);
                return;
            }
        }
        self.print_transcript().await;
    }

    async fn delete_session(&mut self, argument: &str) -> Result<()> {
        let id = {
            let sessions = self.state.engine.sessions().lock().await;
            if argument.is_empty() {
                sessions.active_id().clone()
            } else {
                match pick(argument, sessions.len()) {
                    Some(index) => sessions.sessions()[index].id.clone(),
                    None => {
                        println!("No chat {}. Use /list to see chats.", argument);
                        return Ok(());
                    }
                }
            }
        };

        let answer = self
            .prompt(&format!("{} [y/N] ", chat::store::DELETE_PROMPT))
            .await?
            .unwrap_or_default();
        let confirmed = matches!(answer.trim(), "y" | "Y" | "yes");

        self.remove_session(&id, confirmed).await;
        Ok(())
    }

    async fn remove_session(&self, id: &SessionId, confirmed: bool) {
        let outcome = self
            .state
            .engine
            .sessions()
            .lock()
            .await
            .delete_session(id, &|_: &str| confirmed)
            .await;

        match outcome {
            Ok(Deletion::Deleted { .. }) => {
                println!("Chat deleted.");
                self.reset_server_history().await;
                self.print_transcript().await;
            }
            Ok(Deletion::Declined) => {}
            Err(e) => println!("Could not delete the chat: {}", e),
        }
    }

    async fn capture_voice(&mut self) {
        match self.state.voice.capture().await {
            VoiceOutcome::Transcript(text) => {
                println!("Heard: \"{}\"  (press Enter to send, or type to replace)", text);
                self.draft = Some(text);
            }
            VoiceOutcome::Unsupported(notice) => println!("{}", notice),
            VoiceOutcome::AlreadyListening => println!("Already listening."),
            VoiceOutcome::Failed(message) => println!("Voice input failed: {}", message),
        }
    }

    async fn show_server_history(&self) {
        match self.state.engine.responder().history().await {
            Ok(history) if history.is_empty() => println!("No server history."),
            Ok(history) => {
                for (question, answer) in history {
                    println!("{} {}", self.theme().label("You"), question);
                    println!("{} {}", self.theme().label("Bot"), answer);
                }
            }
            Err(e) => println!("Could not load history: {}", e),
        }
    }

    async fn reset_server_history(&self) {
        if let Err(e) = self.state.engine.responder().reset_history().await {
            warn!("Failed to reset server history: {}", e);
        }
    }
}

fn forbidden_page() -> Next {
    println!("\n403: Access Denied");
    println!("You do not have permission to view this page.");
    Next::Go(Route::Chat.path().to_string())
}

/// Parse a 1-based index into a 0-based one below `len`
fn pick(argument: &str, len: usize) -> Option<usize> {
    argument
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

fn print_message(theme: Theme, message: &Message) {
    let label = match message.sender() {
        Sender::User => "You",
        Sender::Bot => "Bot",
    };
    println!(
        "[{}] {} {}",
        message.display_time(),
        theme.label(label),
        message.text()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::settings::{ClientConfig, StoreKind};

    async fn shell_over(dir: &Path) -> Result<Shell> {
        let config = ClientConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            store_backend: StoreKind::File,
            store_path: dir.to_string_lossy().into_owned(),
            speech_command: None,
        };
        Ok(Shell::new(AppState::init(config).await?))
    }

    /// Put a non-empty directory where the key's file goes, so it can be
    /// neither replaced nor removed
    fn block_key(dir: &Path, key: &str) -> std::io::Result<()> {
        let path = dir.join(key);
        if path.is_file() {
            std::fs::remove_file(&path)?;
        }
        std::fs::create_dir(&path)?;
        std::fs::write(path.join("held"), b"")
    }

    fn goes_to_login(next: &Next) -> bool {
        matches!(next, Next::Go(path) if path == Route::Login.path())
    }

    #[test]
    fn test_pick_is_one_based_and_bounded() {
        assert_eq!(pick("1", 3), Some(0));
        assert_eq!(pick(" 3 ", 3), Some(2));
        assert_eq!(pick("0", 3), None);
        assert_eq!(pick("4", 3), None);
        assert_eq!(pick("two", 3), None);
    }

    #[tokio::test]
    async fn test_unsaved_question_is_reported_and_chat_continues() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut shell = shell_over(dir.path()).await?;
        block_key(dir.path(), common::keys::CHAT_SESSIONS)?;

        assert!(shell.ask("What are the degree requirements?").await.is_none());
        assert!(shell.ask("Who is the chair?").await.is_none());

        let sessions = shell.state.engine.sessions().lock().await;
        let active = sessions.active().unwrap();
        assert!(active.messages.is_empty());
        assert_eq!(
            shell.state.engine.state(&active.id),
            chat::ExchangeState::Idle
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_signs_out_even_when_credential_file_stays() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = shell_over(dir.path()).await?;
        shell
            .state
            .engine
            .auth()
            .lock()
            .await
            .login("eyJhbGciOiJIUzI1NiJ9.e30.c2ln")
            .await?;
        block_key(dir.path(), common::keys::TOKEN)?;

        assert!(goes_to_login(&shell.logout().await));
        assert!(!shell.state.engine.auth().lock().await.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn test_unsaved_sign_in_returns_to_login() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = shell_over(dir.path()).await?;
        block_key(dir.path(), common::keys::TOKEN)?;

        let next = shell.accept_token("eyJhbGciOiJIUzI1NiJ9.e30.c2ln".to_string()).await;
        assert!(goes_to_login(&next));
        assert!(!shell.state.engine.auth().lock().await.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn test_session_changes_that_cannot_be_saved_leave_chats_unchanged() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let shell = shell_over(dir.path()).await?;
        let original = shell.state.engine.sessions().lock().await.active_id().clone();
        block_key(dir.path(), common::keys::CHAT_SESSIONS)?;

        shell.new_session().await;
        shell.remove_session(&original, true).await;

        let sessions = shell.state.engine.sessions().lock().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.active_id(), &original);
        Ok(())
    }
}
