// crates/geomark-cli/src/script.rs

//! # Event scripts
//!
//! A replay script is plain text, one step per line. Blank lines and lines
//! starting with `#` are skipped.
//!
//! | line                 | step                                          |
//! |----------------------|-----------------------------------------------|
//! | `ready`              | `SurfaceReady`                                |
//! | `fail <reason>`      | `SurfaceFailed(reason)`                       |
//! | `click <lat> <lon>`  | `MapClicked`                                  |
//! | `select <id>`        | `MarkerClicked` (ids count up from 1)         |
//! | `close`              | `InfoClosed`                                  |
//! | `remove <id>`        | `MarkerRemoved`                               |
//! | `clear`              | `MarkersCleared`                              |
//! | `locate`             | `LocateRequested`                             |
//! | `search <text>`      | `SearchEdited(text)`; `search` alone clears   |
//! | `pick <n>`           | n-th visible suggestion, 1-based              |
//! | `wait <ms>`          | let the loop run for `ms` milliseconds        |

use anyhow::{bail, Context};
use geomark_core::{Coordinate, MapEvent, MarkerId};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Event(MapEvent),
    Wait(Duration),
}

/// Parses a whole script. Errors name the offending line.
pub fn parse_script(source: &str) -> anyhow::Result<Vec<Step>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            (!line.is_empty() && !line.starts_with('#')).then_some((i + 1, line))
        })
        .map(|(number, line)| parse_line(line).with_context(|| format!("line {number}: {line:?}")))
        .collect()
}

fn parse_line(line: &str) -> anyhow::Result<Step> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let event = match command.to_ascii_lowercase().as_str() {
        "ready" => MapEvent::SurfaceReady,
        "fail" => MapEvent::SurfaceFailed(if rest.is_empty() { "unknown".into() } else { rest.into() }),
        "click" => MapEvent::MapClicked(parse_coordinate(rest)?),
        "select" => MapEvent::MarkerClicked(parse_marker(rest)?),
        "close" => MapEvent::InfoClosed,
        "remove" => MapEvent::MarkerRemoved(parse_marker(rest)?),
        "clear" => MapEvent::MarkersCleared,
        "locate" => MapEvent::LocateRequested,
        "search" => MapEvent::SearchEdited(rest.to_string()),
        "pick" => {
            let n: usize = rest.parse().context("pick needs a suggestion number")?;
            if n == 0 {
                bail!("suggestions are numbered from 1");
            }
            MapEvent::SuggestionSelectedAt(n - 1)
        }
        "wait" => {
            let ms: u64 = rest.parse().context("wait needs milliseconds")?;
            return Ok(Step::Wait(Duration::from_millis(ms)));
        }
        other => bail!("unknown command {other:?}"),
    };
    Ok(Step::Event(event))
}

fn parse_coordinate(rest: &str) -> anyhow::Result<Coordinate> {
    let mut parts = rest.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty());
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("expected \"<lat> <lon>\"");
    };
    let lat: f64 = lat.parse().with_context(|| format!("bad latitude {lat:?}"))?;
    let lon: f64 = lon.parse().with_context(|| format!("bad longitude {lon:?}"))?;
    Ok(Coordinate::new(lat, lon)?)
}

fn parse_marker(rest: &str) -> anyhow::Result<MarkerId> {
    let raw: u64 = rest
        .trim_start_matches('m')
        .parse()
        .context("expected a marker id such as 1 or m1")?;
    Ok(MarkerId::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_session() {
        let steps = parse_script(
            "# morning walk\n\
             ready\n\
             click 42.0 -71.0\n\
             click 42.1,-71.1\n\
             \n\
             select m1\n\
             search   Boston  \n\
             wait 250\n\
             pick 1\n",
        )
        .unwrap();

        assert_eq!(steps.len(), 7);
        assert_eq!(steps[0], Step::Event(MapEvent::SurfaceReady));
        assert_eq!(
            steps[2],
            Step::Event(MapEvent::MapClicked(Coordinate::new(42.1, -71.1).unwrap()))
        );
        assert_eq!(steps[3], Step::Event(MapEvent::MarkerClicked(MarkerId::from(1))));
        assert_eq!(steps[4], Step::Event(MapEvent::SearchEdited("Boston".into())));
        assert_eq!(steps[5], Step::Wait(Duration::from_millis(250)));
        assert_eq!(steps[6], Step::Event(MapEvent::SuggestionSelectedAt(0)));
    }

    #[test]
    fn bare_search_clears_the_box() {
        let steps = parse_script("search").unwrap();
        assert_eq!(steps, vec![Step::Event(MapEvent::SearchEdited(String::new()))]);
    }

    #[test]
    fn errors_point_at_the_line() {
        let err = parse_script("ready\nclick 95 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");

        assert!(parse_script("teleport 1 2").is_err());
        assert!(parse_script("pick 0").is_err());
        assert!(parse_script("click 1").is_err());
    }
}
