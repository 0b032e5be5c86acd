use std::time::Duration;

use anyhow::{Context as _, Result, bail, ensure};
use machine::{Command, MachineConfig, SeekDirection};

/// One statement of a control script.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Send(Command),
    Wait(Duration),
    Status,
}

/// Parses `;`- or newline-separated statements such as
/// `play dotlottie; wait 500; seek-all end; status`.
///
/// Speeds must be one of the configured presets.
pub fn parse_script(text: &str, config: &MachineConfig) -> Result<Vec<Step>> {
    text.split([';', '\n'])
        .map(str::trim)
        .filter(|statement| !statement.is_empty() && !statement.starts_with('#'))
        .map(|statement| {
            parse_statement(statement, config)
                .with_context(|| format!("invalid statement `{statement}`"))
        })
        .collect()
}

fn parse_statement(statement: &str, config: &MachineConfig) -> Result<Step> {
    let words: Vec<&str> = statement.split_whitespace().collect();
    let step = match words.as_slice() {
        ["play", id] => send(Command::Play { id: id.to_string() }),
        ["pause", id] => send(Command::Pause { id: id.to_string() }),
        ["stop", id] => send(Command::Stop { id: id.to_string() }),
        ["loop", id] => send(Command::ToggleLoop { id: id.to_string() }),
        ["seek", id, frame] => send(Command::Seek {
            id: id.to_string(),
            frame: Some(frame.parse().context("frame must be a whole number")?),
        }),
        ["speed", id, value] => send(Command::SetSpeed {
            id: id.to_string(),
            value: parse_speed(value, config)?,
        }),
        ["play-all"] => send(Command::PlayAll),
        ["pause-all"] => send(Command::PauseAll),
        ["stop-all"] => send(Command::StopAll),
        ["loop-all"] => send(Command::LoopAll),
        ["seek-all", direction] => send(Command::SeekAll {
            direction: direction.parse::<SeekDirection>()?,
        }),
        ["speed-all", value] => send(Command::SetGlobalSpeed {
            value: parse_speed(value, config)?,
        }),
        ["retry"] => send(Command::Retry),
        ["wait", millis] => Step::Wait(Duration::from_millis(
            millis.parse().context("wait takes milliseconds")?,
        )),
        ["status"] => Step::Status,
        [keyword, ..] => bail!("unknown or malformed `{keyword}` statement"),
        [] => bail!("empty statement"),
    };
    Ok(step)
}

fn send(command: Command) -> Step {
    Step::Send(command)
}

fn parse_speed(value: &str, config: &MachineConfig) -> Result<f64> {
    let speed: f64 = value.parse().context("speed must be a number")?;
    ensure!(
        config.is_speed_preset(speed),
        "speed {speed} is not one of {:?}",
        config.speed_presets
    );
    Ok(speed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use machine::{Command, MachineConfig, SeekDirection};

    use super::{Step, parse_script};

    #[test]
    fn statements_split_on_semicolons_and_newlines() {
        let steps = parse_script(
            "play-all; wait 250\nseek-all forward\n\nstatus",
            &MachineConfig::default(),
        )
        .expect("script should parse");

        assert_eq!(
            steps,
            vec![
                Step::Send(Command::PlayAll),
                Step::Wait(Duration::from_millis(250)),
                Step::Send(Command::SeekAll {
                    direction: SeekDirection::Forward,
                }),
                Step::Status,
            ]
        );
    }

    #[test]
    fn individual_statements_carry_player_id() {
        let steps = parse_script(
            "seek lottie-web 42; speed dotlottie 1.5",
            &MachineConfig::default(),
        )
        .expect("script should parse");

        assert_eq!(
            steps,
            vec![
                Step::Send(Command::Seek {
                    id: String::from("lottie-web"),
                    frame: Some(42),
                }),
                Step::Send(Command::SetSpeed {
                    id: String::from("dotlottie"),
                    value: 1.5,
                }),
            ]
        );
    }

    #[test]
    fn speed_outside_presets_is_rejected() {
        let error = parse_script("speed-all 3", &MachineConfig::default())
            .expect_err("3x is not a preset");

        let message = format!("{error:#}");
        assert!(message.contains("invalid statement `speed-all 3`"));
        assert!(message.contains("not one of"));
    }

    #[test]
    fn unknown_keyword_is_reported() {
        let error = parse_script("rewind", &MachineConfig::default()).expect_err("unknown keyword");

        assert!(format!("{error:#}").contains("`rewind`"));
    }

    #[test]
    fn comments_are_skipped() {
        let steps = parse_script("# warm up\nretry", &MachineConfig::default())
            .expect("script should parse");

        assert_eq!(steps, vec![Step::Send(Command::Retry)]);
    }
}
