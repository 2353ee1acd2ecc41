// Console demo: a stdin/stdout host and a small page tree
//
// The console host prints every render of the simulated message and turns
// typed commands into interactions:
//
//   press <component>            press a button
//   select <component> <value>   choose a select option
//   submit [field=value ...]     submit the open modal
//   dismiss                      close the open modal without submitting
//   user <id>                    act as another user
//   logs [n]                     show captured log lines
//   json                         dump the last render as JSON
//   quit
//
// Page tree:
//
//   Home (menu, closable)
//   ├── Settings (menu, submenu)
//   │   └── Notifications (submenu) ── About (switched to, not a child)
//   └── Jobs (submenu) ── ConfirmationPage (reset)

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use pagetree::config::Config;
use pagetree::host::{
    ContentEdit, Context, Embed, Host, Interaction, MessageEdit, MessageRef, ModalOutcome,
    ModalSpec, RenderTarget, Surface, UserId,
};
use pagetree::logging::LogBuffer;
use pagetree::page::{
    switch_to, ButtonStyle, CallbackOptions, ChildPage, ChildSpec, Children, Closable, Component,
    ComponentKind, ConfirmationPage, Ending, FromTarget, MenuPage, Page, PageBuilder, PageCore,
    PageKind, ParentPage, Submenu, Switchable,
};
use pagetree::util::lock;
use pagetree::PageResult;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Console host
// ─────────────────────────────────────────────────────────────────────────────

struct PendingModal {
    title: String,
    reply: oneshot::Sender<HashMap<String, String>>,
}

/// Host that renders to stdout and takes modal input from commands
pub struct ConsoleHost {
    modal_timeout: Duration,
    pending_modal: Mutex<Option<PendingModal>>,
    last_edit: Mutex<Option<MessageEdit>>,
}

impl ConsoleHost {
    pub fn new(modal_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            modal_timeout,
            pending_modal: Mutex::new(None),
            last_edit: Mutex::new(None),
        })
    }

    /// Submit the open modal. Returns `false` if none is open.
    pub fn submit(&self, values: HashMap<String, String>) -> bool {
        match lock(&self.pending_modal).take() {
            Some(pending) => {
                debug!(modal = %pending.title, "modal submitted");
                pending.reply.send(values).is_ok()
            }
            None => false,
        }
    }

    /// Close the open modal without submitting. Returns `false` if none is open.
    pub fn dismiss(&self) -> bool {
        lock(&self.pending_modal).take().is_some()
    }

    pub fn last_edit(&self) -> Option<MessageEdit> {
        lock(&self.last_edit).clone()
    }
}

fn print_edit(message: MessageRef, edit: &MessageEdit) {
    println!();
    println!("┌─ message {}/{}", message.channel_id, message.message_id);
    if edit.content == ContentEdit::Clear {
        println!("│ (content cleared)");
    }
    if let Some(embed) = &edit.embed {
        if let Some(title) = &embed.title {
            println!("│ ■ {title}");
        }
        if let Some(description) = &embed.description {
            for line in description.lines() {
                println!("│   {line}");
            }
        }
        for field in &embed.fields {
            println!("│   {}: {}", field.name, field.value);
        }
    }

    let mut row = None;
    for component in &edit.components {
        if component.row != row {
            if row.is_some() {
                println!();
            }
            print!("│ ");
            row = component.row;
        }
        let off = if component.disabled { " (disabled)" } else { "" };
        match &component.kind {
            ComponentKind::Button { label, style, .. } => {
                let mark = match style {
                    ButtonStyle::Danger => "!",
                    ButtonStyle::Success => "+",
                    ButtonStyle::Primary => "*",
                    ButtonStyle::Secondary => " ",
                };
                print!("[{mark}{label}{off} <{}>] ", component.id);
            }
            ComponentKind::Select {
                placeholder,
                options,
            } => {
                println!(
                    "<{}> {}{off}",
                    component.id,
                    placeholder.as_deref().unwrap_or("Select")
                );
                for option in options {
                    let emoji = option.emoji.as_deref().unwrap_or(" ");
                    let description = option.description.as_deref().unwrap_or("");
                    print!("│   {} {emoji} {}  {description}", option.value, option.label);
                    println!();
                }
                print!("│");
            }
        }
    }
    println!();
    println!("└─");
}

#[async_trait]
impl Host for ConsoleHost {
    async fn edit_message(&self, message: MessageRef, edit: MessageEdit) -> PageResult<()> {
        print_edit(message, &edit);
        *lock(&self.last_edit) = Some(edit);
        Ok(())
    }

    async fn defer(&self, interaction: &Interaction) -> PageResult<()> {
        debug!(interaction = interaction.id, "deferred");
        Ok(())
    }

    async fn send_message(
        &self,
        interaction: &Interaction,
        text: &str,
        ephemeral: bool,
    ) -> PageResult<()> {
        let scope = if ephemeral {
            format!("only {} sees this", interaction.user)
        } else {
            "everyone".to_string()
        };
        println!("» {text}  ({scope})");
        Ok(())
    }

    async fn followup(
        &self,
        interaction: &Interaction,
        text: &str,
        ephemeral: bool,
    ) -> PageResult<()> {
        self.send_message(interaction, text, ephemeral).await
    }

    async fn open_modal(
        &self,
        interaction: &Interaction,
        modal: ModalSpec,
    ) -> PageResult<ModalOutcome> {
        let (reply, response) = oneshot::channel();
        {
            let mut pending = lock(&self.pending_modal);
            if pending.is_some() {
                warn!(interaction = interaction.id, "replacing an open modal");
            }
            *pending = Some(PendingModal {
                title: modal.title.clone(),
                reply,
            });
        }

        println!();
        println!("╔═ {} ", modal.title);
        for field in &modal.fields {
            let required = if field.required { " (required)" } else { "" };
            let hint = field.placeholder.as_deref().unwrap_or("");
            println!("║ {}{required}: {hint}  <{}>", field.label, field.id);
        }
        println!("╚═ submit [field=value ...] | dismiss");

        match tokio::time::timeout(self.modal_timeout, response).await {
            Ok(Ok(values)) => Ok(ModalOutcome::Submitted(values)),
            // Dismissed: the host never hears back, same as a timeout
            Ok(Err(_)) => Ok(ModalOutcome::TimedOut),
            Err(_) => {
                lock(&self.pending_modal).take();
                info!(modal = %modal.title, "modal timed out");
                Ok(ModalOutcome::TimedOut)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pages
// ─────────────────────────────────────────────────────────────────────────────

/// Root of the demo tree
pub struct Home {
    core: PageCore,
    children: Children<Home>,
    ending: Ending,
}

impl Home {
    pub fn new(target: Option<RenderTarget>, owner: Option<UserId>) -> Arc<Self> {
        let page = Arc::new_cyclic(|me| {
            let mut builder = PageBuilder::new(me, target);
            if let Some(owner) = owner {
                builder = builder.owned_by(owner);
            }
            Self {
                core: builder.closable().build(),
                children: Children::new(),
                ending: Ending::new(),
            }
        });
        page.attach_menu();
        page
    }
}

#[async_trait]
impl Page for Home {
    fn core(&self) -> &PageCore {
        &self.core
    }

    async fn update(&self) -> PageResult<()> {
        self.core.edit_embed(|embed| {
            embed.title = Some("Home".into());
            embed.description = Some("Pick a section below, or close the editor.".into());
            embed.fields.clear();
        });
        Ok(())
    }
}

impl PageKind for Home {
    const RESETS_CONTENT: bool = true;
}

impl ParentPage for Home {
    fn children(&self) -> &Children<Self> {
        &self.children
    }

    fn declared_children() -> Vec<ChildSpec<Self>> {
        vec![ChildSpec::of::<Settings>(), ChildSpec::of::<Jobs>()]
    }
}

impl MenuPage for Home {
    const PLACEHOLDER: Option<&'static str> = Some("Where to?");
}

impl Closable for Home {
    const CLOSE_TIMEOUT_MESSAGE: &'static str = "Close cancelled: the dialog timed out.";

    fn ending(&self) -> &Ending {
        &self.ending
    }

    fn on_close(&self, ctx: &Context) -> impl Future<Output = PageResult<()>> + Send {
        let user = ctx.user();
        async move {
            info!(%user, "home closed by user");
            Ok(())
        }
    }

    fn on_end(self: Arc<Self>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            let Some(target) = self.core.target() else {
                return;
            };
            let edit = MessageEdit {
                content: ContentEdit::Clear,
                embed: Some(Embed {
                    title: Some("Editor closed".into()),
                    description: Some("This editor is no longer active.".into()),
                    fields: Vec::new(),
                }),
                components: Vec::new(),
            };
            let surface = target.surface();
            if let Err(error) = surface.host().edit_message(surface.message(), edit).await {
                warn!(%error, "could not clear the editor message");
            }
        }
    }
}

/// Settings section with a nested notifications page
pub struct Settings {
    core: PageCore,
    children: Children<Settings>,
}

impl ChildPage for Settings {
    type Parent = Home;
    const DESCRIPTION: Option<&'static str> = Some("Preferences and notifications");
    const EMOJI: Option<&'static str> = Some("⚙");

    fn new_child(parent: &Arc<Home>, target: Option<RenderTarget>) -> Arc<Self> {
        let page = Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target)
                .child_of(parent)
                .submenu()
                .build(),
            children: Children::new(),
        });
        page.attach_menu();
        page
    }
}

#[async_trait]
impl Page for Settings {
    fn core(&self) -> &PageCore {
        &self.core
    }

    async fn update(&self) -> PageResult<()> {
        self.core.edit_embed(|embed| {
            embed.title = Some("Settings".into());
            embed.description = None;
            embed.fields.clear();
        });
        Ok(())
    }
}

impl PageKind for Settings {}
impl Submenu for Settings {}

impl ParentPage for Settings {
    fn children(&self) -> &Children<Self> {
        &self.children
    }

    fn declared_children() -> Vec<ChildSpec<Self>> {
        vec![ChildSpec::of::<Notifications>()]
    }
}

impl MenuPage for Settings {}

pub struct Notifications {
    core: PageCore,
    enabled: AtomicBool,
}

impl Notifications {
    const TOGGLE: &'static str = "notifications:toggle";
    const ABOUT: &'static str = "notifications:about";
}

impl ChildPage for Notifications {
    type Parent = Settings;
    const DESCRIPTION: Option<&'static str> = Some("Turn pings on or off");
    const EMOJI: Option<&'static str> = Some("🔔");

    fn new_child(parent: &Arc<Settings>, target: Option<RenderTarget>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target)
                .child_of(parent)
                .component(
                    Component::button(Self::TOGGLE, "Toggle").style(ButtonStyle::Primary),
                    |page: Arc<Self>, _ctx| async move {
                        page.enabled.fetch_xor(true, Ordering::SeqCst);
                        Ok(())
                    },
                )
                .component(
                    Component::button(Self::ABOUT, "About"),
                    |page: Arc<Self>, ctx| async move {
                        ctx.defer().await?;
                        page.switch_new::<About>().await?;
                        Ok(())
                    },
                )
                .submenu()
                .build(),
            enabled: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl Page for Notifications {
    fn core(&self) -> &PageCore {
        &self.core
    }

    async fn update(&self) -> PageResult<()> {
        let state = if self.enabled.load(Ordering::SeqCst) {
            "on"
        } else {
            "off"
        };
        self.core.edit_embed(|embed| {
            embed.title = Some("Notifications".into());
            embed.description = None;
            embed.fields.clear();
            embed.fields.push(pagetree::host::EmbedField {
                name: "Pings".into(),
                value: state.into(),
                inline: true,
            });
        });
        Ok(())
    }
}

impl PageKind for Notifications {}
impl Submenu for Notifications {}

/// Standalone info page, reached by switching rather than through a menu
pub struct About {
    core: PageCore,
}

impl FromTarget for About {
    fn from_target(target: Option<RenderTarget>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target)
                .component_with(
                    Component::button("about:done", "Done").style(ButtonStyle::Success),
                    CallbackOptions::new().skip_refresh(),
                    |page: Arc<Self>, ctx| async move {
                        ctx.defer().await?;
                        page.stop();
                        Ok(())
                    },
                )
                .build(),
        })
    }
}

#[async_trait]
impl Page for About {
    fn core(&self) -> &PageCore {
        &self.core
    }

    async fn update(&self) -> PageResult<()> {
        self.core.edit_embed(|embed| {
            *embed = Embed::titled("About")
                .field("Crate", "pagetree")
                .field("Version", pagetree::config::VERSION);
        });
        Ok(())
    }
}

impl PageKind for About {
    const TIMEOUT: Option<Duration> = Some(Duration::from_secs(60));
}

/// Long-running jobs behind the processing guard
pub struct Jobs {
    core: PageCore,
    runs: AtomicUsize,
}

impl Jobs {
    const RUN: &'static str = "jobs:run";
    const RESET: &'static str = "jobs:reset";

    async fn run_job(&self) -> PageResult<()> {
        info!("job started");
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.runs.fetch_add(1, Ordering::SeqCst);
        info!("job finished");
        Ok(())
    }

    async fn confirm_reset(&self) -> PageResult<()> {
        let mut target = self.core.target();
        if let Some(target) = target.as_mut() {
            target.embed = Some(Embed::titled("Reset the job counter?"));
        }
        let confirmation = switch_to(ConfirmationPage::new(target)).await?;
        match confirmation.outcome().await {
            Ok(true) => {
                self.runs.store(0, Ordering::SeqCst);
                info!("job counter reset");
            }
            Ok(false) => debug!("reset cancelled"),
            Err(error) => warn!(%error, "reset confirmation ended without an answer"),
        }
        Ok(())
    }
}

impl ChildPage for Jobs {
    type Parent = Home;
    const NAME: Option<&'static str> = Some("Background jobs");
    const EMOJI: Option<&'static str> = Some("🛠");

    fn new_child(parent: &Arc<Home>, target: Option<RenderTarget>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target)
                .child_of(parent)
                .component_with(
                    Component::button(Self::RUN, "Run job").style(ButtonStyle::Primary),
                    CallbackOptions::new().disable_while_processing(),
                    |page: Arc<Self>, ctx| async move {
                        ctx.defer().await?;
                        page.run_job().await
                    },
                )
                .component(
                    Component::button(Self::RESET, "Reset").style(ButtonStyle::Danger),
                    |page: Arc<Self>, ctx| async move {
                        ctx.defer().await?;
                        page.confirm_reset().await
                    },
                )
                .submenu()
                .build(),
            runs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Page for Jobs {
    fn core(&self) -> &PageCore {
        &self.core
    }

    async fn update(&self) -> PageResult<()> {
        let runs = self.runs.load(Ordering::SeqCst);
        self.core.edit_embed(|embed| {
            *embed = Embed::titled("Background jobs").field("Completed runs", runs.to_string());
        });
        Ok(())
    }
}

impl PageKind for Jobs {}
impl Submenu for Jobs {}

// ─────────────────────────────────────────────────────────────────────────────
// Command loop
// ─────────────────────────────────────────────────────────────────────────────

enum Command {
    Press(String),
    Select(String, String),
    Submit(HashMap<String, String>),
    Dismiss,
    User(u64),
    Logs(usize),
    Json,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb {
        "press" | "p" => Command::Press(words.next().context("usage: press <component>")?.into()),
        "select" | "s" => {
            let id = words.next().context("usage: select <component> <value>")?;
            let value = words.next().context("usage: select <component> <value>")?;
            Command::Select(id.into(), value.into())
        }
        "submit" => Command::Submit(
            words
                .map(|pair| match pair.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (pair.to_string(), String::new()),
                })
                .collect(),
        ),
        "dismiss" => Command::Dismiss,
        "user" => Command::User(
            words
                .next()
                .context("usage: user <id>")?
                .parse()
                .context("user id must be a number")?,
        ),
        "logs" => Command::Logs(
            words
                .next()
                .map(str::parse)
                .transpose()
                .context("logs takes a line count")?
                .unwrap_or(20),
        ),
        "json" => Command::Json,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => anyhow::bail!("unknown command {other:?}, try `help`"),
    };
    Ok(Some(command))
}

fn print_help() {
    println!("Commands:");
    println!("  press <component>            press a button");
    println!("  select <component> <value>   choose a select option");
    println!("  submit [field=value ...]     submit the open modal");
    println!("  dismiss                      close the open modal");
    println!("  user <id>                    act as another user");
    println!("  logs [n]                     show the last n log lines");
    println!("  json                         dump the last render as JSON");
    println!("  quit");
}

/// Render the demo tree and drive it from stdin until it ends or `quit`.
pub async fn run(config: &Config, logs: LogBuffer) -> Result<()> {
    let host = ConsoleHost::new(config.console.modal_timeout());
    let surface = Surface::new(host.clone(), config.console.message());
    let owner = config.console.owner();

    let home = Home::new(
        Some(RenderTarget::new(surface.clone(), Some(Embed::titled("Home")))),
        owner,
    );
    let mut session = tokio::spawn({
        let home = home.clone();
        async move {
            let home = switch_to(home).await?;
            home.ended().await;
            PageResult::Ok(())
        }
    });

    print_help();
    let mut user = owner.unwrap_or(UserId(1));
    let mut next_id = 0u64;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            finished = &mut session => {
                finished.context("page session panicked")??;
                println!("Session ended.");
                return Ok(());
            }
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e:#}");
                continue;
            }
        };

        next_id += 1;
        let id = next_id;
        match command {
            Command::Press(component) => {
                if surface.dispatch(Interaction::press(id, user, component)).is_none() {
                    println!("Nothing to press there.");
                }
            }
            Command::Select(component, value) => {
                if surface
                    .dispatch(Interaction::select(id, user, component, value))
                    .is_none()
                {
                    println!("Nothing to select there.");
                }
            }
            Command::Submit(values) => {
                if !host.submit(values) {
                    println!("No modal is open.");
                }
            }
            Command::Dismiss => {
                if !host.dismiss() {
                    println!("No modal is open.");
                }
            }
            Command::User(next) => {
                user = UserId(next);
                println!("Acting as user {user}.");
            }
            Command::Logs(n) => {
                for entry in logs.tail(n) {
                    println!("{entry}");
                }
            }
            Command::Json => match host.last_edit() {
                Some(edit) => println!("{}", serde_json::to_string_pretty(&edit)?),
                None => println!("Nothing rendered yet."),
            },
            Command::Help => print_help(),
            Command::Quit => break,
        }
    }

    // Leaving early still runs on_end
    home.stop();
    home.ended().await;
    session.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse_command("").unwrap(), None));
        assert!(matches!(
            parse_command("press closable:close").unwrap(),
            Some(Command::Press(id)) if id == "closable:close"
        ));
        assert!(matches!(
            parse_command("select menu:select 1").unwrap(),
            Some(Command::Select(id, value)) if id == "menu:select" && value == "1"
        ));
        assert!(matches!(parse_command("logs").unwrap(), Some(Command::Logs(20))));
        assert!(parse_command("logs many").is_err());
        assert!(parse_command("select menu:select").is_err());
        assert!(parse_command("fly").is_err());
    }

    #[test]
    fn test_parse_submit_values() {
        let Some(Command::Submit(values)) = parse_command("submit dummy=:wave: note").unwrap()
        else {
            panic!("expected submit");
        };
        assert_eq!(values.get("dummy").map(String::as_str), Some(":wave:"));
        assert_eq!(values.get("note").map(String::as_str), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_modal_times_out() {
        let host = ConsoleHost::new(Duration::from_secs(5));
        let interaction = Interaction::press(1, UserId(1), "closable:close");

        let outcome = host
            .open_modal(&interaction, ModalSpec::new("Close this editor?"))
            .await
            .unwrap();

        assert!(outcome.is_timed_out());
        assert!(!host.dismiss());
    }

    #[tokio::test]
    async fn test_console_modal_submit() {
        let host = ConsoleHost::new(Duration::from_secs(5));
        let waiting = {
            let host = host.clone();
            tokio::spawn(async move {
                let interaction = Interaction::press(1, UserId(1), "closable:close");
                host.open_modal(&interaction, ModalSpec::new("Close this editor?"))
                    .await
            })
        };
        while !host.pending_modal.lock().map(|p| p.is_some()).unwrap_or(false) {
            tokio::task::yield_now().await;
        }

        assert!(host.submit(HashMap::from([("dummy".to_string(), "ok".to_string())])));
        let outcome = waiting.await.unwrap().unwrap();
        assert!(matches!(outcome, ModalOutcome::Submitted(values) if values["dummy"] == "ok"));
    }

    #[tokio::test]
    async fn test_demo_tree_menu_options() {
        let home = Home::new(None, None);
        let select = home
            .core()
            .component(&pagetree::page::MENU_SELECT)
            .expect("menu attached");
        // Close button holds the bottom row
        assert_eq!(select.row, Some(3));
        let ComponentKind::Select { options, .. } = select.kind else {
            panic!("not a select");
        };
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["Settings", "Background jobs"]);
    }
}
