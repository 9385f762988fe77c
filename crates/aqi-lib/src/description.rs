//! Static "About the AQI" text and its word-by-word reveal

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Pause between revealed words
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(5);

pub const AQI_DESCRIPTION: &str = "About the Air Quality Index (AQI)
The Air Quality Index (AQI) is a standardized system used to measure and report the quality of air in a specific area. It provides an easy-to-understand scale that indicates how polluted the air is and what the associated health effects might be for the general public. The AQI ranges from 0 to 500, with higher values indicating greater air pollution and higher potential health risks.

AQI Categories:
0-50 (Good): Air quality is considered satisfactory, and air pollution poses little or no risk.
51-100 (Moderate): Air quality is acceptable; however, some pollutants may be a concern for sensitive individuals.
101-150 (Unhealthy for Sensitive Groups): Members of sensitive groups, such as children, elderly, and individuals with respiratory or heart conditions, may experience health effects.
151-200 (Unhealthy): Everyone may begin to experience health effects; members of sensitive groups may experience more serious effects.
201-300 (Very Unhealthy): Health alert: Everyone may experience more serious health effects.
301-500 (Hazardous): Health warnings of emergency conditions. The entire population is likely to be affected.

The AQI considers key pollutants such as PM2.5, PM10, carbon monoxide (CO), ozone (O₃), nitrogen dioxide (NO₂), and sulfur dioxide (SO₂). This information helps individuals make informed decisions to protect their health, such as limiting outdoor activities during poor air quality days.

For more information, refer to your local environmental agency or the World Health Organization (WHO) guidelines on air quality.";

/// Chunks in reveal order: the text split on single spaces, each followed by a space
pub fn description_words() -> impl Iterator<Item = String> {
    AQI_DESCRIPTION.split(' ').map(|word| format!("{} ", word))
}

/// Reveal the description one chunk at a time with `delay` between chunks.
///
/// Spawns a producer task, so this must be called inside a tokio runtime.
/// The producer stops early if the stream is dropped.
pub fn description_stream(delay: Duration) -> ReceiverStream<String> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        for (i, word) in description_words().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if tx.send(word).await.is_err() {
                break;
            }
        }
    });

    ReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn test_words_reassemble_the_text() {
        let joined: String = description_words().collect();
        assert_eq!(joined.trim_end_matches(' '), AQI_DESCRIPTION);
    }

    #[test]
    fn test_every_category_is_described() {
        for category in crate::classifier::AqiCategory::ALL {
            assert!(AQI_DESCRIPTION.contains(&format!("({})", category.label())));
        }
    }

    #[tokio::test]
    async fn test_stream_yields_same_words_in_order() {
        let streamed: Vec<String> = description_stream(Duration::ZERO).collect().await;
        let expected: Vec<String> = description_words().collect();
        assert_eq!(streamed, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_waits_between_words() {
        let start = tokio::time::Instant::now();
        let count = description_stream(Duration::from_millis(5)).collect::<Vec<_>>().await.len();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(5) * (count as u32 - 1));
    }
}
