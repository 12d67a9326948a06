//! Beam search decoding.
//!
//! Follows the reference `generate` beam search: every step expands all
//! live beams, keeps the best `2 * num_beams` continuations, retires
//! EOS-terminated candidates as finished hypotheses and carries the best
//! `num_beams` non-EOS candidates forward. Finished hypotheses are ranked by
//! `sum_logprobs / len^length_penalty`, where `len` counts the decoder start
//! token but not EOS.

use crate::config::GenerationConfig;
use crate::error::{BrevityError, Result};

/// Initial score of every beam but the first, so step one expands a single
/// beam instead of `num_beams` identical ones.
const INACTIVE_BEAM_SCORE: f32 = -1e9;

/// Beam search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamSearchConfig {
    pub num_beams: usize,
    /// Maximum decoder length, decoder start token included.
    pub max_length: usize,
    /// EOS is masked while the decoder sequence is shorter than this.
    pub min_length: usize,
    pub length_penalty: f32,
    pub early_stopping: bool,
}

impl From<&GenerationConfig> for BeamSearchConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            num_beams: config.num_beams,
            max_length: config.max_length,
            min_length: config.min_length,
            length_penalty: config.length_penalty,
            early_stopping: config.early_stopping,
        }
    }
}

/// A configured beam search over some next-token scorer.
#[derive(Debug, Clone)]
pub struct BeamSearch {
    config: BeamSearchConfig,
    decoder_start: u32,
    eos: u32,
}

impl BeamSearch {
    pub fn new(config: BeamSearchConfig, decoder_start: u32, eos: u32) -> Self {
        Self {
            config,
            decoder_start,
            eos,
        }
    }

    /// Run the search.
    ///
    /// `next_logits` receives the live beams (equal-length token sequences
    /// starting with the decoder start token) and returns one row of raw
    /// vocabulary logits per beam. Returns the generated tokens of the best
    /// hypothesis, without the start token and without EOS.
    pub fn run<F>(&self, mut next_logits: F) -> Result<Vec<u32>>
    where
        F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
    {
        let num_beams = self.config.num_beams;
        if num_beams == 0 {
            return Err(BrevityError::InvalidInput(
                "beam search needs at least one beam".to_string(),
            ));
        }

        let mut beams: Vec<Vec<u32>> = vec![vec![self.decoder_start]; num_beams];
        let mut beam_scores: Vec<f32> = (0..num_beams)
            .map(|i| if i == 0 { 0.0 } else { INACTIVE_BEAM_SCORE })
            .collect();
        let mut finished = BeamHypotheses::new(
            num_beams,
            self.config.length_penalty,
            self.config.early_stopping,
        );
        let mut cur_len = 1;
        let mut done = false;

        while cur_len < self.config.max_length {
            let logits = next_logits(&beams)?;
            if logits.len() != num_beams {
                return Err(BrevityError::UnexpectedOutput(format!(
                    "expected {} logit rows, got {}",
                    num_beams,
                    logits.len()
                )));
            }

            let candidates = self.top_candidates(&logits, &beam_scores, cur_len)?;

            let mut next: Vec<Candidate> = Vec::with_capacity(num_beams);
            for (rank, candidate) in candidates.iter().enumerate() {
                if candidate.token == self.eos {
                    // EOS below the top `num_beams` ranks is not a finished hypothesis.
                    if rank >= num_beams {
                        continue;
                    }
                    finished.add(beams[candidate.beam].clone(), candidate.score);
                } else {
                    next.push(*candidate);
                }
                if next.len() == num_beams {
                    break;
                }
            }
            if next.len() < num_beams {
                return Err(BrevityError::UnexpectedOutput(format!(
                    "vocabulary too small to keep {} beams alive",
                    num_beams
                )));
            }

            done = finished.is_done(candidates[0].score, cur_len);

            beams = next
                .iter()
                .map(|c| {
                    let mut seq = beams[c.beam].clone();
                    seq.push(c.token);
                    seq
                })
                .collect();
            beam_scores = next.iter().map(|c| c.score).collect();
            cur_len += 1;

            if done {
                break;
            }
        }

        if !done {
            for (seq, score) in beams.into_iter().zip(beam_scores) {
                finished.add(seq, score);
            }
        }

        let best = finished.best().ok_or(BrevityError::EmptyOutput)?;
        Ok(best.iter().skip(1).copied().collect())
    }

    /// Best `2 * num_beams` continuations over all beams, highest first.
    fn top_candidates(
        &self,
        logits: &[Vec<f32>],
        beam_scores: &[f32],
        cur_len: usize,
    ) -> Result<Vec<Candidate>> {
        let vocab = logits[0].len();
        if vocab == 0 || logits.iter().any(|row| row.len() != vocab) {
            return Err(BrevityError::UnexpectedOutput(
                "logit rows must share a non-zero vocabulary size".to_string(),
            ));
        }
        let eos = self.eos as usize;
        let suppress_eos = cur_len < self.config.min_length;

        let mut candidates: Vec<Candidate> = Vec::with_capacity(logits.len() * vocab);
        for (beam, row) in logits.iter().enumerate() {
            let mut log_probs = log_softmax(row);
            if suppress_eos && eos < vocab {
                log_probs[eos] = f32::NEG_INFINITY;
            }
            candidates.extend(log_probs.into_iter().enumerate().map(|(token, lp)| Candidate {
                score: lp + beam_scores[beam],
                beam,
                token: token as u32,
            }));
        }

        let keep = (2 * self.config.num_beams).min(candidates.len());
        if keep < candidates.len() {
            candidates.select_nth_unstable_by(keep - 1, Candidate::ranking);
            candidates.truncate(keep);
        }
        candidates.sort_by(Candidate::ranking);
        Ok(candidates)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    beam: usize,
    token: u32,
}

impl Candidate {
    /// Descending score; ties broken by beam then token for determinism.
    fn ranking(a: &Self, b: &Self) -> std::cmp::Ordering {
        b.score
            .total_cmp(&a.score)
            .then(a.beam.cmp(&b.beam))
            .then(a.token.cmp(&b.token))
    }
}

/// The best `capacity` finished hypotheses seen so far.
#[derive(Debug)]
struct BeamHypotheses {
    capacity: usize,
    length_penalty: f32,
    early_stopping: bool,
    hyps: Vec<(f32, Vec<u32>)>,
    worst_score: f32,
}

impl BeamHypotheses {
    fn new(capacity: usize, length_penalty: f32, early_stopping: bool) -> Self {
        Self {
            capacity,
            length_penalty,
            early_stopping,
            hyps: Vec::with_capacity(capacity + 1),
            worst_score: 1e9,
        }
    }

    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f32) {
        let score = sum_logprobs / (tokens.len() as f32).powf(self.length_penalty);
        if self.hyps.len() < self.capacity || score > self.worst_score {
            self.hyps.push((score, tokens));
            if self.hyps.len() > self.capacity {
                if let Some(worst) = self
                    .hyps
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.0.total_cmp(&b.1.0))
                    .map(|(i, _)| i)
                {
                    self.hyps.remove(worst);
                }
                self.worst_score = self
                    .hyps
                    .iter()
                    .map(|(s, _)| *s)
                    .fold(f32::INFINITY, f32::min);
            } else {
                self.worst_score = self.worst_score.min(score);
            }
        }
    }

    /// Whether no live beam can still produce a better hypothesis.
    fn is_done(&self, best_sum_logprobs: f32, cur_len: usize) -> bool {
        if self.hyps.len() < self.capacity {
            return false;
        }
        if self.early_stopping {
            return true;
        }
        let best_reachable = best_sum_logprobs / (cur_len as f32).powf(self.length_penalty);
        self.worst_score >= best_reachable
    }

    fn best(&self) -> Option<&[u32]> {
        self.hyps
            .iter()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, tokens)| tokens.as_slice())
    }
}

/// Numerically stable log-softmax.
pub(crate) fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let log_sum = logits.iter().map(|x| (x - max).exp()).sum::<f32>().ln() + max;
    logits.iter().map(|x| x - log_sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u32 = 0;
    const EOS: u32 = 1;
    const A: u32 = 2;
    const B: u32 = 3;
    const C: u32 = 4;
    const VOCAB: usize = 5;
    const OFF: f32 = -1e4;

    fn config(num_beams: usize, max_length: usize, min_length: usize) -> BeamSearchConfig {
        BeamSearchConfig {
            num_beams,
            max_length,
            min_length,
            length_penalty: 1.0,
            early_stopping: true,
        }
    }

    /// Logits that put (almost) all mass on `token`.
    fn peaked(token: u32) -> Vec<f32> {
        let mut row = vec![OFF; VOCAB];
        row[token as usize] = 0.0;
        row
    }

    /// After the start token: A with p=0.6, B with p=0.4. A is followed by
    /// EOS; B is followed by C and then EOS.
    fn fork(seq: &[u32]) -> Vec<f32> {
        match &seq[1..] {
            [] => {
                let mut row = vec![OFF; VOCAB];
                row[A as usize] = 0.6f32.ln();
                row[B as usize] = 0.4f32.ln();
                row
            }
            [b] if *b == B => peaked(C),
            _ => peaked(EOS),
        }
    }

    #[test]
    fn log_softmax_normalizes() {
        let lp = log_softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = lp.iter().map(|x| x.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(lp[2] > lp[1] && lp[1] > lp[0]);
    }

    #[test]
    fn follows_dominant_path_until_eos() {
        let script = [A, B, C, A];
        let search = BeamSearch::new(config(2, 20, 0), START, EOS);

        let out = search
            .run(|beams| {
                Ok(beams
                    .iter()
                    .map(|seq| peaked(*script.get(seq.len() - 1).unwrap_or(&EOS)))
                    .collect())
            })
            .unwrap();

        assert_eq!(out, script);
    }

    #[test]
    fn eos_is_masked_below_min_length() {
        let search = BeamSearch::new(config(2, 50, 6), START, EOS);

        // The model always wants to stop.
        let out = search
            .run(|beams| Ok(beams.iter().map(|_| peaked(EOS)).collect()))
            .unwrap();

        // Finished hypotheses have at least `min_length` tokens including start.
        assert!(out.len() + 1 >= 6, "got {} tokens", out.len());
        assert!(!out.contains(&EOS));
    }

    #[test]
    fn stops_at_max_length() {
        let search = BeamSearch::new(config(2, 8, 0), START, EOS);

        let out = search
            .run(|beams| Ok(beams.iter().map(|_| peaked(A)).collect()))
            .unwrap();

        assert_eq!(out.len(), 7);
        assert!(out.iter().all(|&t| t == A));
    }

    #[test]
    fn length_penalty_prefers_longer_hypothesis() {
        let mut cfg = config(2, 20, 0);

        cfg.length_penalty = 2.0;
        let long = BeamSearch::new(cfg, START, EOS)
            .run(|beams| Ok(beams.iter().map(|s| fork(s)).collect()))
            .unwrap();
        assert_eq!(long, vec![B, C]);

        cfg.length_penalty = 0.0;
        let short = BeamSearch::new(cfg, START, EOS)
            .run(|beams| Ok(beams.iter().map(|s| fork(s)).collect()))
            .unwrap();
        assert_eq!(short, vec![A]);
    }

    #[test]
    fn without_early_stopping_finds_same_best() {
        let mut cfg = config(2, 20, 0);
        cfg.length_penalty = 2.0;
        cfg.early_stopping = false;

        let out = BeamSearch::new(cfg, START, EOS)
            .run(|beams| Ok(beams.iter().map(|s| fork(s)).collect()))
            .unwrap();
        assert_eq!(out, vec![B, C]);
    }

    #[test]
    fn first_step_expands_a_single_beam() {
        let search = BeamSearch::new(config(3, 3, 0), START, EOS);
        let mut first_step = true;

        search
            .run(|beams| {
                if first_step {
                    assert_eq!(beams.len(), 3);
                    assert!(beams.iter().all(|b| b == &vec![START]));
                    first_step = false;
                } else {
                    // Three distinct continuations of the single live beam.
                    let mut seconds: Vec<u32> = beams.iter().map(|b| b[1]).collect();
                    seconds.sort();
                    seconds.dedup();
                    assert_eq!(seconds.len(), 3);
                }
                Ok(beams.iter().map(|_| vec![0.0; VOCAB]).collect())
            })
            .unwrap();
    }

    #[test]
    fn scorer_errors_propagate() {
        let search = BeamSearch::new(config(2, 10, 0), START, EOS);
        let result = search.run(|_| Err(BrevityError::Inference("device lost".into())));
        assert!(matches!(result, Err(BrevityError::Inference(_))));
    }

    #[test]
    fn wrong_row_count_is_rejected() {
        let search = BeamSearch::new(config(2, 10, 0), START, EOS);
        let result = search.run(|_| Ok(vec![peaked(A)]));
        assert!(matches!(result, Err(BrevityError::UnexpectedOutput(_))));
    }

    #[test]
    fn zero_beams_is_invalid() {
        let search = BeamSearch::new(config(0, 10, 0), START, EOS);
        assert!(search.run(|_| Ok(vec![])).is_err());
    }
}
