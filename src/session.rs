//! Line-oriented console front end.
//!
//! Each input line is either a command keyword (`capture`, `spaces`, `cps`,
//! `register`, `start`, `quit`, `help`), `status`, or a pointer gesture in
//! image pixels:
//!
//! ```text
//! press X Y [remove]
//! release X Y
//! drag X1 Y1 X2 Y2
//! ```
//!
//! Blank lines and lines starting with `#` are skipped, so a whole session
//! can be scripted from a file.

use std::io::{self, BufRead, Write};

use tracing::info;

use crate::controller::{Command, CommandOutcome, EditMode, PointerOutcome, SetupController};
use crate::editor::{LandmarkOutcome, PointerEvent, RegionOutcome};
use crate::error::SetupError;
use crate::handoff::Handoff;
use crate::operator::Operator;
use crate::site::{ControlPointId, Coord, Pixel, SiteId, World};

/// One parsed input line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionInput {
    Blank,
    Status,
    Command(Command),
    Pointer(PointerEvent),
    /// A press followed by a release.
    Drag(PointerEvent, PointerEvent),
}

/// Parses one line of session input.
pub fn parse_line(line: &str) -> Result<SessionInput, SetupError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(SessionInput::Blank);
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    let unknown = || SetupError::UnknownCommand(line.to_string());

    match words.as_slice() {
        ["status"] => Ok(SessionInput::Status),
        ["press", x, y] => Ok(SessionInput::Pointer(PointerEvent::press(
            number(x, line)?,
            number(y, line)?,
        ))),
        ["press", x, y, "remove"] => Ok(SessionInput::Pointer(PointerEvent::remove_press(
            number(x, line)?,
            number(y, line)?,
        ))),
        ["release", x, y] => Ok(SessionInput::Pointer(PointerEvent::release(
            number(x, line)?,
            number(y, line)?,
        ))),
        ["drag", x1, y1, x2, y2] => Ok(SessionInput::Drag(
            PointerEvent::press(number(x1, line)?, number(y1, line)?),
            PointerEvent::release(number(x2, line)?, number(y2, line)?),
        )),
        [keyword] => Command::from_keyword(keyword)
            .map(SessionInput::Command)
            .ok_or_else(unknown),
        _ => Err(unknown()),
    }
}

fn number(word: &str, line: &str) -> Result<f64, SetupError> {
    word.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SetupError::UnknownCommand(line.to_string()))
}

/// Parses a world coordinate answer: `EASTING NORTHING` or `EASTING,NORTHING`.
pub fn parse_world_coordinate(answer: &str) -> Option<Coord<World>> {
    let mut parts = answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Coord::new(x, y))
}

/// An [`Operator`] that talks over a text stream.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads the next line, without its line ending. `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        self.print(prompt).ok()?;
        self.next_line().ok().flatten()
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.ask(&format!("{} [y/N] ", prompt))
            .map(|answer| {
                let answer = answer.trim().to_ascii_lowercase();
                answer == "y" || answer == "yes"
            })
            .unwrap_or(false)
    }

    fn request_world_coordinate(
        &mut self,
        id: ControlPointId,
        position: Coord<Pixel>,
    ) -> Option<Coord<World>> {
        loop {
            let answer = self.ask(&format!(
                "World coordinate of control point {} at {} as 'EASTING NORTHING' in metres (blank to skip): ",
                id, position
            ))?;
            let answer = answer.trim();
            if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
                return None;
            }
            match parse_world_coordinate(answer) {
                Some(world) => return Some(world),
                None => self.notify(&format!("'{}' is not a coordinate pair", answer)),
            }
        }
    }

    fn notify(&mut self, message: &str) {
        let _ = self.print(&format!("{}\n", message));
    }
}

/// How a session finished.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub site_id: Option<SiteId>,
    pub handoff: Option<Handoff>,
    /// Input ran out before the operator quit or started monitoring.
    pub interrupted: bool,
}

/// Drives `controller` from `console` until the session ends or input runs
/// out.
///
/// Rejected commands are reported to the operator and the session goes on;
/// only I/O failures on the console itself end it with an error.
pub fn run_session<R: BufRead, W: Write>(
    controller: &mut SetupController,
    console: &mut ConsoleOperator<R, W>,
) -> Result<SessionSummary, SetupError> {
    let mut summary = SessionSummary::default();
    console.print("PiPark setup. Type 'help' for commands.\n")?;

    while !controller.has_ended() {
        console.print(&prompt(controller))?;
        let Some(line) = console.next_line()? else {
            info!("input closed before the session ended");
            summary.interrupted = true;
            break;
        };

        let input = match parse_line(&line) {
            Ok(input) => input,
            Err(err) => {
                console.notify(&format!("{} (type 'help' for commands)", err));
                continue;
            }
        };

        match input {
            SessionInput::Blank => {}
            SessionInput::Status => {
                let text = status(controller);
                console.print(&text)?;
            }
            SessionInput::Command(command) => match controller.dispatch(command, console) {
                Ok(outcome) => {
                    match &outcome {
                        CommandOutcome::Registered(site_id) => {
                            summary.site_id = Some(site_id.clone());
                        }
                        CommandOutcome::Started(handoff) => {
                            summary.handoff = Some(handoff.clone());
                        }
                        _ => {}
                    }
                    let text = describe_command(&outcome);
                    console.notify(&text);
                }
                Err(err) => console.notify(&format!("error: {}", err)),
            },
            SessionInput::Pointer(event) => pointer(controller, console, &event),
            SessionInput::Drag(press, release) => {
                pointer(controller, console, &press);
                pointer(controller, console, &release);
            }
        }
    }

    Ok(summary)
}

fn pointer<R: BufRead, W: Write>(
    controller: &mut SetupController,
    console: &mut ConsoleOperator<R, W>,
    event: &PointerEvent,
) {
    match controller.handle_pointer(event, console) {
        Ok(outcome) => {
            if let Some(text) = describe_pointer(outcome) {
                console.notify(&text);
            }
        }
        Err(err) => console.notify(&format!("error: {}", err)),
    }
}

fn prompt(controller: &SetupController) -> String {
    match controller.mode() {
        EditMode::Off => "pipark> ".to_string(),
        EditMode::Spaces => "pipark [spaces]> ".to_string(),
        EditMode::ControlPoints => "pipark [cps]> ".to_string(),
    }
}

fn status(controller: &SetupController) -> String {
    let site = controller.site();
    let image = site
        .image()
        .map(|image| format!("{} ({}x{})", image.file_name, image.width, image.height))
        .unwrap_or_else(|| "none".to_string());
    let registered = site
        .site_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "no".to_string());
    let enabled = controller
        .enabled_commands()
        .iter()
        .map(|cmd| cmd.keyword())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "image: {}\nparking spaces: {}\ncontrol points: {}\nregistered: {}\nenabled: {}\n",
        image,
        site.spaces().len(),
        site.control_points().len(),
        registered,
        enabled
    )
}

fn describe_command(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Captured {
            width,
            height,
            cleared,
        } => {
            let mut text = format!("Setup image captured ({}x{}).", width, height);
            if cleared.spaces > 0 || cleared.control_points > 0 {
                text.push_str(&format!(
                    " Cleared {} parking space(s) and {} control point(s).",
                    cleared.spaces, cleared.control_points
                ));
            }
            text
        }
        CommandOutcome::CaptureCancelled => "Capture cancelled.".to_string(),
        CommandOutcome::ModeChanged(EditMode::Off) => "Editing off.".to_string(),
        CommandOutcome::ModeChanged(EditMode::Spaces) => "Editing parking spaces.".to_string(),
        CommandOutcome::ModeChanged(EditMode::ControlPoints) => {
            "Editing control points.".to_string()
        }
        CommandOutcome::Registered(site_id) => format!(
            "Registered as site {}. Type 'start' to hand over to the monitor.",
            site_id
        ),
        CommandOutcome::Started(handoff) => format!(
            "Site {} handed over; site file written to {}.",
            handoff.site_id,
            handoff.site_file.display()
        ),
        CommandOutcome::StartCancelled => "Staying in setup.".to_string(),
        CommandOutcome::Quit => "Setup ended.".to_string(),
        CommandOutcome::QuitCancelled => "Quit cancelled.".to_string(),
        CommandOutcome::Help(text) => text.trim_end().to_string(),
    }
}

fn describe_pointer(outcome: PointerOutcome) -> Option<String> {
    match outcome {
        PointerOutcome::Region(RegionOutcome::Added(id)) => {
            Some(format!("Parking space {} added.", id))
        }
        PointerOutcome::Region(RegionOutcome::Removed(id)) => {
            Some(format!("Parking space {} removed.", id))
        }
        PointerOutcome::Region(RegionOutcome::Discarded) => {
            Some("Invalid parking space discarded.".to_string())
        }
        PointerOutcome::Landmark(LandmarkOutcome::Added(id)) => {
            Some(format!("Control point {} added.", id))
        }
        PointerOutcome::Landmark(LandmarkOutcome::Removed(id)) => {
            Some(format!("Control point {} removed.", id))
        }
        PointerOutcome::Ignored => Some("Not editing; type 'spaces' or 'cps' first.".to_string()),
        PointerOutcome::Region(RegionOutcome::Started | RegionOutcome::Ignored)
        | PointerOutcome::Landmark(LandmarkOutcome::Ignored) => None,
    }
}
