//! Optional LLM enrichment of a classified [`Summary`].
//!
//! The summary is sent once to the completion service together with a fixed worked
//! example. The reply is reconciled against the summary shape: a reply that reads as a
//! summary replaces it ([`SummaryArtifact::Structured`]), anything else is kept as
//! [`SummaryArtifact::Raw`] text. A failed reconciliation is a value, not an error.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::config::ModelSettings;
use crate::contract::{ChatMessage, CompletionClient, CompletionRequest};
use crate::error::EnrichError;
use crate::summary::{Summary, SummaryArtifact};

const SYSTEM_PROMPT: &str =
    "You are an expert in computational analysis and technical hardware and its documentation.";

const EXAMPLE_PROMPT: &str = r#"
You are an expert in analyzing JSON summary related to Linux device drivers. Given the following summary extracted from a PDF, provide additional relevant information and improve the summary with more detailed insights. I'm giving you JSON-based context data on a sensor or microdevice. I want a concise practical summary on it like this:

Example:
Device Name: AIS328DQ
Device Type: 3-axis linear accelerometer
Key Features:
- AEC-Q100 qualification
- Wide supply voltage range: 2.4 V to 3.6 V
- Low voltage compatible IOs: 1.8 V
- Ultra-low-power mode consumption: down to 10 μA
- ±2g/±4g/±8g dynamically selectable full scale
- SPI / I²C digital output interface
- 16-bit data output
- 2 independent programmable interrupt generators
- Extended temperature range: -40 °C to 105 °C
- Embedded self-test
- High shock survivability: up to 10000 g
- ECOPACK, RoHS and "Green" compliant

Communication Interface: SPI / I²C digital output interface

Register Addresses and Descriptions:
- 0Fh WHO_AM_I: Device identification register
- 20h CTRL_REG1: Power mode selection and data rate selection
- 21h CTRL_REG2: High-pass filter mode selection and cut-off frequency configuration
- 22h CTRL_REG3: Configuration for interrupt 1 source
- 23h CTRL_REG4: Block data update, big/little endian data selection, full-scale selection, self-test enable, SPI serial interface mode selection
- 24h CTRL_REG5: Turn-on mode selection for sleep-to-wake function
- 25h HP_FILTER_RESET: Dummy register for resetting the high-pass filter
- 26h REFERENCE: Reference value for high-pass filter
- 27h STATUS_REG: Status of overrun and new data available for X, Y, and Z axes
- 28h, 29h OUT_X_L, OUT_X_H: X-axis acceleration data
- 2A, 2B, 2C, 2D OUT_Y_L, OUT_Y_H, OUT_Z_L, OUT_Z_H: Y-axis and Z-axis acceleration data
- 30h INT1_CFG: Configuration for interrupt 1 source
- 31h INT1_SRC: Interrupt 1 source register
- 32h INT1_THS: Interrupt 1 threshold
- 33h INT1_DURATION: Minimum duration of interrupt 1 event to be recognized
- 34h INT2_CFG: Configuration for interrupt 2 source
- 35h INT2_SRC: Interrupt 2 source register
- 36h INT2_THS: Interrupt 2 threshold
- 37h INT2_DURATION: Minimum duration of interrupt 2 event to be recognized

Package Information: QFN 24 (4 x 4 x 1.8 mm)
Soldering Information:
- Compliant with JEDEC J-STD-020C, in MSL3 conditions
- General guidelines and recommendations for PCB design, stencil design, and solder paste application
- Process considerations for soldering and cleaning

Here is the real raw data that you have to generate summary from. Note: only take inspiration from the above example, generate using the raw data. Also, do not use any formatting like bold or italics. It should have all details about the device hardware and types and properties.

Raw data Summary:
"#;

/// Build the three-message enrichment prompt for a serialized summary.
pub fn build_messages(serialized_summary: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(EXAMPLE_PROMPT),
        ChatMessage::user(serialized_summary),
    ]
}

/// Reconcile a completion reply with the summary shape.
///
/// Surrounding whitespace and a single Markdown code fence are removed before parsing.
pub fn reconcile(reply: &str) -> SummaryArtifact {
    let trimmed = reply.trim();
    let candidate = strip_code_fence(trimmed);
    match serde_json::from_str::<Summary>(candidate) {
        Ok(summary) => SummaryArtifact::Structured(summary),
        Err(e) => {
            error!(
                error = %e,
                "[ENRICH] Failed to parse enrichment reply as summary JSON, keeping raw text"
            );
            SummaryArtifact::Raw(trimmed.to_string())
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)\A```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\z").expect("static regex")
    });
    fence
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
}

/// Enrichment stage bound to one completion client.
pub struct Enricher<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    settings: ModelSettings,
}

impl<'a, C: CompletionClient + ?Sized> Enricher<'a, C> {
    pub fn new(client: &'a C, settings: ModelSettings) -> Self {
        Self { client, settings }
    }

    /// Send the summary for enrichment. Exactly one completion call is made; an
    /// unparseable reply is not an error.
    pub async fn enrich(&self, summary: &Summary) -> Result<SummaryArtifact, EnrichError> {
        let serialized = summary.to_pretty_json().map_err(EnrichError::Serialize)?;
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: build_messages(&serialized),
            max_tokens: self.settings.max_tokens,
        };

        info!(
            model = %request.model,
            max_tokens = request.max_tokens,
            "[ENRICH] Requesting summary enrichment"
        );
        let reply = self.client.complete(request).await.map_err(|e| {
            error!(error = %e, "[ENRICH][ERROR] Completion call failed");
            e
        })?;

        let artifact = reconcile(&reply);
        if artifact.is_structured() {
            info!("[ENRICH] Enrichment reply reconciled as structured summary");
        } else {
            warn!(chars = reply.len(), "[ENRICH] Enrichment reply kept as raw text");
        }
        Ok(artifact)
    }
}
