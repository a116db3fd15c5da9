//! Training-data synthesis: one completion call seeded with the reference driver
//! source and the datasheet summary.
//!
//! The reply is trusted as-is. [`GeneratedDataset::records`] offers a best-effort parse
//! for reporting, but nothing here gates persistence on it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ModelSettings;
use crate::contract::{ChatMessage, CompletionClient, CompletionRequest};
use crate::error::{GenerationFailed, InputError, InputKind, InputMissing};
use crate::summary::SummaryArtifact;

const SYSTEM_PROMPT: &str = "You are an expert C and C++ programmer.";

/// Transition phrase every assistant record opens with.
pub const ASSISTANT_TRANSITION: &str = "The driver code will contain all these parts in order -";

const TEMPLATE_PROMPT: &str = r#"I'm giving you a hardware datasheet summary generated using unstructured.io, along with its related hardware code. Using this data, you have to generate all essential functions that are used to inialiase, powerUP powerDown and start, stop,and perform certain actions, This is supposed to really detailed training data for an AI, I want you to generate a comprehensive JSON output with the following requirements:

 Task_name: A one line detailed description of what that function does, with it's context of entire purpose of the entire file

 Instruction: In a question or task oriented tone, write a action statement of the code.

 Information:breifly explain what the function does, in context of the hardware, the module and the function, the concerned module performs on the software.

 Solution: the function code

 Remember you have to perform this for each and every function required!


follow this template strictly

    TEMPLATE:
            {
    "message":[
        {
        "role":"user",
        "TaskName":"",
        "Instruction":"",
        "Information":"",

        },
        {
            "role":"assistant",
            "content":{
                "text":"The driver code will contain all these parts in order -",
               "Solution":""
            }


        }
    ]
}


Now here is a reference only sample of how this has to be done, remember this is just a reference, you have to generate the code using the raw data provided next.
now assume you have some python code that you want to generate this kind of JSON output for, you can use the following code as a reference to generate the JSON output:
     Example Raw code:
    #!/usr/bin/env python # -*- coding: utf-8 -*-
    '''Simple server which adds a DocumentWordsProvider to the CodeCompletion worker.
    On Windows, this script is frozen by freeze_setup.py (cx_Freeze).'''

    from pyciode.core import backend
    if name -- backend.CodeCompletionWorker.providers.append(backend.DocumentWordsProvider())
    backend.serve_forever()



 Example reference Generation :

 "message":[
     {
     "role":"user",
     "TaskName":" Adding a DocumentWordsProvider to a CodeCompletion worker ",
     "Instruction":"Write a Python code to add a DocumentWordsProvider to a CodeCompletion worker.",
     "Information":"The CodeCompletion worker is from the pyciode.core.backend module. The DocumentWordsProvider is used to provide word completion suggestions for a given document. ",

     },
     {
         "role":"assistant",
         "content":{
             "text":"The driver code will contain all these parts in order -",
            "Solution":from pyciode.core import backend
           if name_ == '_main_': backend.CodeCompletionWorker.providers.append(backend.DocumentWordsProvider()) backend.serve_forever() Note: This script is used to add a DocumentWordsProvider to a CodeCompletion worker in a simple server. The script is frozen by freeze_setup.py on Windows.
         }


     }
 ]







 "#;

/// One entry of the synthesized dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum TrainingRecord {
    User {
        #[serde(rename = "TaskName")]
        task_name: String,
        #[serde(rename = "Instruction")]
        instruction: String,
        #[serde(rename = "Information")]
        information: String,
    },
    Assistant {
        content: AssistantContent,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantContent {
    pub text: String,
    #[serde(rename = "Solution")]
    pub solution: String,
}

/// Alternating user/assistant records, one pair per driver function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub message: Vec<TrainingRecord>,
}

impl TrainingDataset {
    /// Number of complete user/assistant pairs.
    pub fn pair_count(&self) -> usize {
        self.message
            .chunks(2)
            .filter(|pair| {
                matches!(
                    pair,
                    [TrainingRecord::User { .. }, TrainingRecord::Assistant { .. }]
                )
            })
            .count()
    }
}

/// The model's reply, persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDataset {
    pub raw: String,
}

impl GeneratedDataset {
    /// Best-effort parse of the reply. Failure says nothing about whether the reply is
    /// written; the raw text always is.
    pub fn records(&self) -> Result<TrainingDataset, serde_json::Error> {
        serde_json::from_str(&self.raw)
    }
}

/// The two inputs synthesis is seeded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub reference_source: String,
    /// Summary artifact text as handed to the model (the persisted `summary.json`).
    pub summary_text: String,
}

impl SynthesisRequest {
    pub fn new(
        reference_source: impl Into<String>,
        summary: &SummaryArtifact,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            reference_source: reference_source.into(),
            summary_text: summary.to_prompt_text()?,
        })
    }

    /// Load both inputs from disk. Either file being absent is [`InputError::Missing`].
    pub fn from_paths(reference_path: &Path, summary_path: &Path) -> Result<Self, InputError> {
        let reference_source = read_required(reference_path, InputKind::ReferenceSource)?;
        let summary_text = read_required(summary_path, InputKind::Summary)?;
        Ok(Self {
            reference_source,
            summary_text,
        })
    }
}

fn read_required(path: &Path, input: InputKind) -> Result<String, InputError> {
    if !path.is_file() {
        error!(path = %path.display(), %input, "[SYNTH] Required input not found");
        return Err(InputMissing::new(input, path).into());
    }
    std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the four-message synthesis prompt.
pub fn build_messages(request: &SynthesisRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(TEMPLATE_PROMPT),
        ChatMessage::user(request.reference_source.as_str()),
        // One-shot context rather than a prior turn of this conversation.
        ChatMessage::assistant(request.summary_text.as_str()),
    ]
}

/// Synthesis stage bound to one completion client.
pub struct Synthesizer<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    settings: ModelSettings,
}

impl<'a, C: CompletionClient + ?Sized> Synthesizer<'a, C> {
    pub fn new(client: &'a C, settings: ModelSettings) -> Self {
        Self { client, settings }
    }

    /// Single attempt; a completion failure becomes [`GenerationFailed`].
    pub async fn synthesise(
        &self,
        request: &SynthesisRequest,
    ) -> Result<GeneratedDataset, GenerationFailed> {
        let completion = CompletionRequest {
            model: self.settings.model.clone(),
            messages: build_messages(request),
            max_tokens: self.settings.max_tokens,
        };
        info!(
            model = %completion.model,
            max_tokens = completion.max_tokens,
            reference_chars = request.reference_source.len(),
            summary_chars = request.summary_text.len(),
            "[SYNTH] Requesting training data synthesis"
        );

        let reply = self.client.complete(completion).await.map_err(|e| {
            error!(error = %e, "[SYNTH][ERROR] Completion call failed");
            GenerationFailed(e)
        })?;

        Ok(GeneratedDataset {
            raw: reply.trim().to_string(),
        })
    }
}
