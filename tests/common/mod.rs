//! In-memory models, tokenizer and loader shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use brevity::providers::DeviceCache;
use brevity::{
    Brevity, BrevityError, Device, EncodedInput, EncoderOutput, ModelLoader, Result,
    Seq2SeqModel, SentimentHandle, SequenceClassifier, SlotId, SpecialTokens, SummarizerHandle,
    TextTokenizer,
};

pub const PAD: u32 = 0;
pub const EOS: u32 = 1;
pub const UNK: u32 = 2;

/// Words known to [`WordTokenizer`], after the three special tokens.
pub const VOCAB: &[&str] = &[
    "summarize:",
    "the",
    "quick",
    "brown",
    "fox",
    "jumps",
    "over",
    "lazy",
    "dog",
    "many",
    "times",
];

pub const FOX_TEXT: &str = "The quick brown fox jumps over the lazy dog many times in a long \
                            paragraph describing nothing of importance.";

// ============================================================================
// Tokenizer
// ============================================================================

/// Whitespace tokenizer over a fixed vocabulary. Appends EOS on encode and
/// drops special tokens on decode.
pub struct WordTokenizer {
    words: Vec<String>,
    ids: HashMap<String, u32>,
}

impl WordTokenizer {
    pub fn new(vocab: &[&str]) -> Self {
        let words: Vec<String> = ["<pad>", "</s>", "<unk>"]
            .iter()
            .chain(vocab.iter())
            .map(|w| w.to_string())
            .collect();
        let ids = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        Self { words, ids }
    }

    pub fn id(&self, word: &str) -> u32 {
        self.ids.get(word).copied().unwrap_or(UNK)
    }

    pub fn vocab_size(&self) -> usize {
        self.words.len()
    }
}

impl TextTokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Result<EncodedInput> {
        let mut ids: Vec<u32> = text
            .split_whitespace()
            .map(|w| self.id(&w.to_lowercase()))
            .collect();
        ids.push(EOS);
        Ok(EncodedInput::from_ids(&ids))
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        Ok(ids
            .iter()
            .filter(|&&id| id > UNK)
            .filter_map(|&id| self.words.get(id as usize))
            .cloned()
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }
}

// ============================================================================
// Models
// ============================================================================

/// Logits that put all mass on `token`.
pub fn peaked(token: u32, vocab: usize) -> Vec<f32> {
    let mut row = vec![-1e4; vocab];
    row[token as usize] = 0.0;
    row
}

/// Emits `script` token by token, then asks for EOS.
pub struct ScriptedSeq2Seq {
    script: Vec<u32>,
    vocab: usize,
    encodes: Arc<AtomicUsize>,
}

impl DeviceCache for ScriptedSeq2Seq {}

impl Seq2SeqModel for ScriptedSeq2Seq {
    fn encode(&self, input: &EncodedInput) -> Result<EncoderOutput> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        let len = input.len();
        EncoderOutput::new(vec![0.0; len * 4], len, 4, input.attention_mask.clone())
    }

    fn next_token_logits(
        &self,
        _encoder: &EncoderOutput,
        decoder_input_ids: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        Ok(decoder_input_ids
            .iter()
            .map(|seq| {
                let next = self.script.get(seq.len() - 1).copied().unwrap_or(EOS);
                peaked(next, self.vocab)
            })
            .collect())
    }

    fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens {
            decoder_start: PAD,
            eos: EOS,
            pad: PAD,
        }
    }
}

/// Fails every forward pass.
pub struct FailingSeq2Seq;

impl DeviceCache for FailingSeq2Seq {}

impl Seq2SeqModel for FailingSeq2Seq {
    fn encode(&self, _input: &EncodedInput) -> Result<EncoderOutput> {
        Err(BrevityError::Inference("device lost".to_string()))
    }

    fn next_token_logits(
        &self,
        _encoder: &EncoderOutput,
        _decoder_input_ids: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        Err(BrevityError::Inference("device lost".to_string()))
    }

    fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens::default()
    }
}

/// Panics in the decoder, after a successful encode.
pub struct PanickingSeq2Seq;

impl DeviceCache for PanickingSeq2Seq {}

impl Seq2SeqModel for PanickingSeq2Seq {
    fn encode(&self, input: &EncodedInput) -> Result<EncoderOutput> {
        let len = input.len();
        EncoderOutput::new(vec![0.0; len * 4], len, 4, input.attention_mask.clone())
    }

    fn next_token_logits(
        &self,
        _encoder: &EncoderOutput,
        _decoder_input_ids: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        panic!("decoder output shape mismatch")
    }

    fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens::default()
    }
}

/// Panics on every forward pass.
pub struct PanickingClassifier {
    calls: Arc<AtomicUsize>,
}

impl DeviceCache for PanickingClassifier {}

impl SequenceClassifier for PanickingClassifier {
    fn logits(&self, _input: &EncodedInput) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("classifier head missing")
    }
}

/// Returns the same logits for every input.
pub struct FixedClassifier {
    logits: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl DeviceCache for FixedClassifier {}

impl SequenceClassifier for FixedClassifier {
    fn logits(&self, _input: &EncodedInput) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.logits.clone())
    }
}

// ============================================================================
// Loader
// ============================================================================

#[derive(Debug, Clone)]
pub enum Summarizer {
    /// Generates these words.
    Script(Vec<&'static str>),
    /// Loads, then fails at inference.
    Failing,
    /// Loads, then panics at inference.
    PanicAtInference,
    /// Fails to load.
    LoadError,
    /// Panics while loading.
    Panic,
}

#[derive(Debug, Clone)]
pub enum Sentiment {
    Logits(Vec<f32>),
    /// Loads, then panics at inference.
    PanicAtInference,
    LoadError,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub summarizer_loads: AtomicUsize,
    pub sentiment_loads: AtomicUsize,
    pub encodes: Arc<AtomicUsize>,
    pub classifications: Arc<AtomicUsize>,
}

pub struct FakeLoader {
    summarizer: Summarizer,
    sentiment: Sentiment,
    counters: Arc<Counters>,
}

impl FakeLoader {
    pub fn new(summarizer: Summarizer, sentiment: Sentiment) -> Self {
        Self {
            summarizer,
            sentiment,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }
}

impl Default for FakeLoader {
    /// Both models load; the summarizer writes "the quick fox jumps" and the
    /// classifier leans positive.
    fn default() -> Self {
        Self::new(
            Summarizer::Script(vec!["the", "quick", "fox", "jumps"]),
            Sentiment::Logits(vec![-1.0, 0.5, 2.0]),
        )
    }
}

impl ModelLoader for FakeLoader {
    fn load_summarizer(&self, _device: Device) -> Result<SummarizerHandle> {
        self.counters.summarizer_loads.fetch_add(1, Ordering::SeqCst);
        let tokenizer = WordTokenizer::new(VOCAB);
        let model: Box<dyn Seq2SeqModel> = match &self.summarizer {
            Summarizer::Script(words) => Box::new(ScriptedSeq2Seq {
                script: words.iter().map(|w| tokenizer.id(w)).collect(),
                vocab: tokenizer.vocab_size(),
                encodes: self.counters.encodes.clone(),
            }),
            Summarizer::Failing => Box::new(FailingSeq2Seq),
            Summarizer::PanicAtInference => Box::new(PanickingSeq2Seq),
            Summarizer::LoadError => {
                return Err(BrevityError::ModelLoad {
                    slot: SlotId::Summarizer,
                    message: "encoder_model.onnx not found".to_string(),
                });
            }
            Summarizer::Panic => panic!("onnxruntime shared library missing"),
        };
        Ok(SummarizerHandle {
            model,
            tokenizer: Box::new(tokenizer),
        })
    }

    fn load_sentiment(&self, _device: Device) -> Result<SentimentHandle> {
        self.counters.sentiment_loads.fetch_add(1, Ordering::SeqCst);
        match &self.sentiment {
            Sentiment::Logits(logits) => Ok(SentimentHandle {
                model: Box::new(FixedClassifier {
                    logits: logits.clone(),
                    calls: self.counters.classifications.clone(),
                }),
                tokenizer: Box::new(WordTokenizer::new(VOCAB)),
            }),
            Sentiment::PanicAtInference => Ok(SentimentHandle {
                model: Box::new(PanickingClassifier {
                    calls: self.counters.classifications.clone(),
                }),
                tokenizer: Box::new(WordTokenizer::new(VOCAB)),
            }),
            Sentiment::LoadError => Err(BrevityError::ModelLoad {
                slot: SlotId::SentimentClassifier,
                message: "repository not found".to_string(),
            }),
        }
    }
}

/// Build a CPU instance over `loader`.
pub fn build(loader: FakeLoader) -> Brevity {
    Brevity::builder()
        .loader(loader)
        .device(Device::Cpu)
        .build()
        .expect("default configuration is valid")
}

/// Both slots failed to load.
pub fn unavailable() -> Brevity {
    build(FakeLoader::new(Summarizer::LoadError, Sentiment::LoadError))
}
