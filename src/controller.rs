//! The setup workflow.
//!
//! [`SetupController`] owns the [`SiteConfiguration`] for the whole session
//! and enforces the order of the workflow:
//!
//! 1. capture a reference image
//! 2. draw parking spaces and place control points
//! 3. register the site with the server
//! 4. hand it over to the monitoring program
//!
//! Commands arrive through [`SetupController::dispatch`] and pointer input
//! through [`SetupController::handle_pointer`]. Anything that needs the
//! operator's attention goes through the [`Operator`] passed into each call.

use std::fmt;

use tracing::{debug, info, warn};

use crate::capture::ImageSource;
use crate::editor::{
    LandmarkEditor, LandmarkOutcome, PointerEvent, RegionEditor, RegionOutcome,
    DEFAULT_PICK_RADIUS,
};
use crate::error::SetupError;
use crate::handoff::{Handoff, MonitorLauncher};
use crate::operator::Operator;
use crate::registration::RegistrationClient;
use crate::site::{ClearedEntries, SiteConfiguration, SiteId};
use crate::validation::{validate_site, ValidateOptions};

/// Controller configuration.
#[derive(Clone, Debug)]
pub struct SetupOptions {
    /// Echo every action to the operator.
    pub verbose: bool,
    /// Ask the camera for a live preview while capturing.
    pub preview: bool,
    /// Control-point pick radius in image pixels.
    pub pick_radius: f64,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            preview: false,
            pick_radius: DEFAULT_PICK_RADIUS,
        }
    }
}

/// Operator commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    CaptureImage,
    ToggleRegionEditing,
    ToggleLandmarkEditing,
    Register,
    Start,
    Quit,
    ShowHelp,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::CaptureImage,
        Command::ToggleRegionEditing,
        Command::ToggleLandmarkEditing,
        Command::Register,
        Command::Start,
        Command::Quit,
        Command::ShowHelp,
    ];

    /// The keyword an operator types for this command.
    pub fn keyword(self) -> &'static str {
        match self {
            Command::CaptureImage => "capture",
            Command::ToggleRegionEditing => "spaces",
            Command::ToggleLandmarkEditing => "cps",
            Command::Register => "register",
            Command::Start => "start",
            Command::Quit => "quit",
            Command::ShowHelp => "help",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.keyword() == keyword)
    }

    fn summary(self) -> &'static str {
        match self {
            Command::CaptureImage => "take a new setup image (clears spaces and control points)",
            Command::ToggleRegionEditing => "toggle parking-space editing",
            Command::ToggleLandmarkEditing => "toggle control-point editing",
            Command::Register => "register the site with the server",
            Command::Start => "hand the registered site to the monitoring program",
            Command::Quit => "end the session",
            Command::ShowHelp => "show this help",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Which editor receives pointer events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Off,
    Spaces,
    ControlPoints,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Editing,
    Registered,
    Ended,
}

/// What a command did.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    Captured {
        width: u32,
        height: u32,
        cleared: ClearedEntries,
    },
    /// The operator declined one of the capture confirmations.
    CaptureCancelled,
    ModeChanged(EditMode),
    Registered(SiteId),
    Started(Handoff),
    /// The operator chose to stay in setup.
    StartCancelled,
    Quit,
    /// The operator chose to keep their unregistered edits.
    QuitCancelled,
    Help(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    Region(RegionOutcome),
    Landmark(LandmarkOutcome),
    /// No editing mode is active.
    Ignored,
}

pub struct SetupController {
    site: SiteConfiguration,
    options: SetupOptions,
    camera: Box<dyn ImageSource>,
    registrar: Box<dyn RegistrationClient>,
    launcher: Box<dyn MonitorLauncher>,
    regions: RegionEditor,
    landmarks: LandmarkEditor,
    mode: EditMode,
    phase: SessionPhase,
    busy: bool,
}

impl SetupController {
    pub fn new(
        options: SetupOptions,
        camera: Box<dyn ImageSource>,
        registrar: Box<dyn RegistrationClient>,
        launcher: Box<dyn MonitorLauncher>,
    ) -> Self {
        let landmarks = LandmarkEditor::new(options.pick_radius);
        Self {
            site: SiteConfiguration::new(),
            options,
            camera,
            registrar,
            launcher,
            regions: RegionEditor::new(),
            landmarks,
            mode: EditMode::Off,
            phase: SessionPhase::Editing,
            busy: false,
        }
    }

    /// Starts the session from an existing configuration, e.g. one seeded
    /// with the setup image already on disk.
    pub fn with_site(mut self, site: SiteConfiguration) -> Self {
        if site.site_id().is_some() {
            self.phase = SessionPhase::Registered;
        }
        self.site = site;
        self
    }

    pub fn site(&self) -> &SiteConfiguration {
        &self.site
    }

    pub fn options(&self) -> &SetupOptions {
        &self.options
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    /// Whether `command` would currently be accepted.
    pub fn is_enabled(&self, command: Command) -> bool {
        if self.busy || self.phase == SessionPhase::Ended {
            return false;
        }
        let editing = self.phase == SessionPhase::Editing;
        let has_image = self.site.image().is_some_and(|image| !image.is_empty());

        match command {
            Command::CaptureImage => editing,
            Command::ToggleRegionEditing | Command::ToggleLandmarkEditing => editing && has_image,
            Command::Register => {
                editing && validate_site(&self.site, &ValidateOptions::default()).is_ok()
            }
            Command::Start => self.phase == SessionPhase::Registered,
            Command::Quit | Command::ShowHelp => true,
        }
    }

    /// Every command currently accepted, in menu order.
    pub fn enabled_commands(&self) -> Vec<Command> {
        Command::ALL
            .into_iter()
            .filter(|cmd| self.is_enabled(*cmd))
            .collect()
    }

    /// Runs one operator command.
    ///
    /// # Errors
    /// `State` when the command is out of workflow order or the controller is
    /// busy. Other errors come from the collaborator involved; in every case
    /// the site configuration is left as it was.
    pub fn dispatch(
        &mut self,
        command: Command,
        operator: &mut dyn Operator,
    ) -> Result<CommandOutcome, SetupError> {
        self.ensure_accepting()?;
        info!(%command, "command");

        match command {
            Command::CaptureImage => self.capture_image(operator),
            Command::ToggleRegionEditing => self.toggle_mode(EditMode::Spaces, operator),
            Command::ToggleLandmarkEditing => self.toggle_mode(EditMode::ControlPoints, operator),
            Command::Register => self.register(operator),
            Command::Start => self.start(operator),
            Command::Quit => self.quit(operator),
            Command::ShowHelp => Ok(CommandOutcome::Help(help_text())),
        }
    }

    /// Routes a pointer event to the active editor.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        operator: &mut dyn Operator,
    ) -> Result<PointerOutcome, SetupError> {
        self.ensure_accepting()?;
        if self.site.is_frozen() {
            return Err(SetupError::state("the site is registered; it can no longer be edited"));
        }

        match self.mode {
            EditMode::Off => Ok(PointerOutcome::Ignored),
            EditMode::Spaces => {
                let outcome = self.regions.handle(&mut self.site, event)?;
                match outcome {
                    RegionOutcome::Added(id) => {
                        if let Some(space) = self.site.space(id) {
                            let message = format!("added parking space {} {}", id, space.rect);
                            self.echo(operator, &message);
                        }
                    }
                    RegionOutcome::Removed(id) => {
                        self.echo(operator, &format!("removed parking space {}", id));
                    }
                    RegionOutcome::Discarded => {
                        self.echo(operator, "discarded invalid parking space");
                    }
                    RegionOutcome::Started | RegionOutcome::Ignored => {}
                }
                Ok(PointerOutcome::Region(outcome))
            }
            EditMode::ControlPoints => {
                let outcome = self.landmarks.handle(&mut self.site, event)?;
                match outcome {
                    LandmarkOutcome::Added(id) => {
                        let message = format!("added control point {} at {}", id, event.position);
                        self.echo(operator, &message);
                        if let Some(world) = operator.request_world_coordinate(id, event.position) {
                            match self.site.set_world_coordinate(id, Some(world)) {
                                Ok(()) => self.echo(
                                    operator,
                                    &format!("control point {} is at {} on site", id, world),
                                ),
                                Err(err) => {
                                    warn!(
                                        control_point = %id,
                                        error = %err,
                                        "world coordinate rejected"
                                    );
                                    operator.notify(&format!(
                                        "world coordinate for control point {} ignored: {}",
                                        id, err
                                    ));
                                }
                            }
                        }
                    }
                    LandmarkOutcome::Removed(id) => {
                        self.echo(operator, &format!("removed control point {}", id));
                    }
                    LandmarkOutcome::Ignored => {}
                }
                Ok(PointerOutcome::Landmark(outcome))
            }
        }
    }

    fn ensure_accepting(&self) -> Result<(), SetupError> {
        if self.busy {
            return Err(SetupError::state("busy; wait for the current action to finish"));
        }
        if self.phase == SessionPhase::Ended {
            return Err(SetupError::state("the session has ended"));
        }
        Ok(())
    }

    fn echo(&self, operator: &mut dyn Operator, message: &str) {
        debug!("{}", message);
        if self.options.verbose {
            operator.notify(message);
        }
    }

    fn capture_image(&mut self, operator: &mut dyn Operator) -> Result<CommandOutcome, SetupError> {
        if self.site.is_frozen() {
            return Err(SetupError::state(
                "the site is registered; its setup image can no longer change",
            ));
        }

        if self.site.has_entries() {
            let prompt = format!(
                "A new setup image deletes all {} parking space(s) and {} control point(s). Continue?",
                self.site.spaces().len(),
                self.site.control_points().len()
            );
            if !operator.confirm(&prompt) {
                return Ok(CommandOutcome::CaptureCancelled);
            }
        }
        if !operator.confirm("Ready to take the setup image?") {
            return Ok(CommandOutcome::CaptureCancelled);
        }

        self.busy = true;
        let captured = self.camera.capture(self.options.preview);
        self.busy = false;

        let image = captured.map_err(|err| {
            warn!(error = %err, "capture failed");
            err
        })?;
        let (width, height) = (image.width, image.height);
        let cleared = self.site.replace_image(image)?;
        self.regions.reset();

        info!(
            width,
            height,
            cleared_spaces = cleared.spaces,
            cleared_control_points = cleared.control_points,
            "setup image captured"
        );
        self.echo(operator, &format!("setup image captured ({}x{})", width, height));

        Ok(CommandOutcome::Captured {
            width,
            height,
            cleared,
        })
    }

    fn toggle_mode(
        &mut self,
        target: EditMode,
        operator: &mut dyn Operator,
    ) -> Result<CommandOutcome, SetupError> {
        if self.mode == target {
            self.mode = EditMode::Off;
        } else {
            if self.site.image().map_or(true, |image| image.is_empty()) {
                return Err(SetupError::state("take a setup image before editing"));
            }
            if self.site.is_frozen() {
                return Err(SetupError::state(
                    "the site is registered; it can no longer be edited",
                ));
            }
            self.mode = target;
        }
        self.regions.reset();

        self.echo(operator, &format!("edit mode: {:?}", self.mode));
        Ok(CommandOutcome::ModeChanged(self.mode))
    }

    fn register(&mut self, operator: &mut dyn Operator) -> Result<CommandOutcome, SetupError> {
        if let Some(site_id) = self.site.site_id() {
            return Err(SetupError::state(format!(
                "the site is already registered as {}",
                site_id
            )));
        }

        let report = validate_site(&self.site, &ValidateOptions::default());
        if !report.is_ok() {
            let message = report
                .errors()
                .map(|issue| issue.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SetupError::validation(message));
        }

        self.regions.reset();
        self.site.freeze();
        info!(
            spaces = self.site.spaces().len(),
            control_points = self.site.control_points().len(),
            "submitting registration"
        );

        self.busy = true;
        let submitted = self.registrar.submit(&self.site);
        self.busy = false;

        match submitted {
            Ok(site_id) => {
                self.site.finalize(site_id.clone());
                self.mode = EditMode::Off;
                self.phase = SessionPhase::Registered;
                info!(site = %site_id, "site registered");
                match self.launcher.persist(&self.site) {
                    Ok(path) => self.echo(
                        operator,
                        &format!("registered as site {}, saved to {}", site_id, path.display()),
                    ),
                    Err(err) => {
                        warn!(site = %site_id, error = %err, "registered site was not saved");
                        operator.notify(&format!(
                            "site {} is registered but could not be saved: {}",
                            site_id, err
                        ));
                    }
                }
                Ok(CommandOutcome::Registered(site_id))
            }
            Err(err) => {
                self.site.unfreeze();
                warn!(error = %err, "registration failed");
                Err(err.into())
            }
        }
    }

    fn start(&mut self, operator: &mut dyn Operator) -> Result<CommandOutcome, SetupError> {
        if self.phase != SessionPhase::Registered {
            return Err(SetupError::state(
                "register the site before starting the monitoring program",
            ));
        }

        if !operator.confirm("Ready to leave setup and start monitoring?") {
            return Ok(CommandOutcome::StartCancelled);
        }

        let handoff = self.launcher.launch(&self.site)?;
        self.phase = SessionPhase::Ended;
        self.echo(
            operator,
            &format!("site file written to {}", handoff.site_file.display()),
        );
        Ok(CommandOutcome::Started(handoff))
    }

    fn quit(&mut self, operator: &mut dyn Operator) -> Result<CommandOutcome, SetupError> {
        let unsaved = self.phase == SessionPhase::Editing
            && (self.site.image().is_some() || self.site.has_entries());
        if unsaved && !operator.confirm("The site is not registered. Discard it and quit?") {
            return Ok(CommandOutcome::QuitCancelled);
        }

        self.phase = SessionPhase::Ended;
        info!("session ended");
        Ok(CommandOutcome::Quit)
    }
}

/// Operator help text.
pub fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for command in Command::ALL {
        text.push_str(&format!("  {:<10} {}\n", command.keyword(), command.summary()));
    }
    text.push_str(
        "\nWhile editing, pointer input draws spaces (press, then release at the \
         opposite corner) or places control points (press). Hold the remove \
         modifier to delete the space or control point under the pointer.\n",
    );
    text
}
