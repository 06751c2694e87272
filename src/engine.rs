//! Verification engine: challenge issuance, submission validation, target
//! reconstruction, analysis, scoring, and session logging behind one
//! shareable handle.

use crate::analysis::{self, AnalysisInput, FlashWindow, PulseWindow, TrackingSample};
use crate::challenge::view::{client_view, ClientChallenge};
use crate::challenge::{generate, Challenge, ChallengeBody};
use crate::config::Config;
use crate::http::error::ApiError;
use crate::reconstruct;
use crate::scoring::{Scorecard, ScoringPolicy};
use crate::session::{EmbedSessionInfo, SessionRecord, SessionSink};
use crate::store::ChallengeStore;
use crate::token::{self, ReceiptClaims, TokenClaims};
use crate::types::{
    EmbedSubmission, InputMethod, Mode, RequestMeta, Rect, VerdictClass, VerifySubmission,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const MIN_POINTER_STANDALONE: usize = 50;
const MIN_POINTER_EMBED: usize = 30;
const MIN_HOVER_TOUCH_MS: f64 = 4_000.0;
const MIN_HOVER_MS: f64 = 3_000.0;
const MIN_PULSE_LOG: usize = 2;
/// Reported cumulative hover may disagree with the hover intervals by this
/// fraction before the recomputed total overrides it.
const HOVER_DISAGREEMENT: f64 = 0.2;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResult {
    pub ok: bool,
    pub token: String,
    pub challenge: ClientChallenge,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub ok: bool,
    pub session_id: String,
    pub score: f64,
    pub verdict: String,
    pub verdict_class: VerdictClass,
    pub verified: bool,
    pub receipt: String,
    #[serde(flatten)]
    pub embed: Option<EmbedSessionInfo>,
}

pub struct VerificationEngine {
    cfg: Config,
    policy: ScoringPolicy,
    store: ChallengeStore,
    sink: Arc<dyn SessionSink>,
}

impl VerificationEngine {
    pub fn new(cfg: Config, sink: Arc<dyn SessionSink>) -> Self {
        Self::with_policy(cfg, ScoringPolicy::default(), sink)
    }

    pub fn with_policy(cfg: Config, policy: ScoringPolicy, sink: Arc<dyn SessionSink>) -> Self {
        Self {
            cfg,
            policy,
            store: ChallengeStore::new(),
            sink,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn pending_challenges(&self) -> usize {
        self.store.len()
    }

    pub fn sweep(&self, now_ms: u64) -> usize {
        self.store.sweep(now_ms)
    }

    /// Admin/debug read path; never exposed to task clients.
    pub fn challenge_snapshot(&self, id: &str) -> Option<Challenge> {
        self.store.get_clone(id)
    }

    pub fn verify_receipt(&self, receipt: &str) -> Option<ReceiptClaims> {
        token::verify_claims(&self.cfg.secret, receipt)
    }

    pub fn issue_standalone(&self, now_ms: u64) -> anyhow::Result<IssueResult> {
        let challenge = generate::new_standalone(now_ms, self.cfg.challenge_ttl_ms);
        self.issue_challenge(challenge)
    }

    pub fn issue_embed(&self, now_ms: u64) -> anyhow::Result<IssueResult> {
        let challenge = generate::new_embed(now_ms, self.cfg.embed_ttl_ms());
        self.issue_challenge(challenge)
    }

    /// Install a pre-built challenge and sign its token. The HTTP surface
    /// only issues generated challenges; this entry point exists for
    /// embedding and deterministic harnesses.
    pub fn issue_challenge(&self, challenge: Challenge) -> anyhow::Result<IssueResult> {
        let claims = TokenClaims {
            challenge_id: challenge.id.clone(),
            mode: challenge.mode(),
            expires_at_ms: challenge.expires_at_ms,
        };
        let token = token::sign_claims(&self.cfg.secret, &claims)?;
        let view = client_view(&challenge);
        self.store.insert(challenge);
        Ok(IssueResult {
            ok: true,
            token,
            challenge: view,
        })
    }

    pub fn verify_standalone(
        &self,
        sub: &VerifySubmission,
        meta: &RequestMeta,
        now_ms: u64,
    ) -> Result<VerifyResponse, ApiError> {
        let claims: TokenClaims =
            token::verify_claims(&self.cfg.secret, &sub.token).ok_or(ApiError::InvalidToken)?;
        self.store
            .precheck(&claims.challenge_id, Mode::Standalone, now_ms)?;

        // Shape checks run after the token gate but before consumption, so
        // a client can fix its payload and retry.
        if sub.pointer.len() < MIN_POINTER_STANDALONE {
            return Err(ApiError::InsufficientPointerData);
        }
        let phases = sub.phases.ok_or(ApiError::MissingPhases)?;
        let canvas = sub.canvas.ok_or(ApiError::MissingCanvas)?;
        if !(canvas.width > 0.0 && canvas.height > 0.0) {
            return Err(ApiError::MissingCanvas);
        }

        let challenge = self.store.consume(&claims.challenge_id, now_ms)?;
        let ChallengeBody::Standalone(params) = &challenge.body else {
            return Err(ApiError::WrongChallengeMode);
        };

        // Reconstruct ground truth at each sample; out-of-order samples and
        // anything outside the tracked phases are dropped.
        let mut samples: Vec<TrackingSample> = Vec::with_capacity(sub.pointer.len());
        let mut last_t = f64::NEG_INFINITY;
        for p in &sub.pointer {
            if !(p.t.is_finite() && p.x.is_finite() && p.y.is_finite()) || p.t < last_t {
                continue;
            }
            if p.t > phases.test_end {
                break;
            }
            last_t = p.t;
            let Some(r) = reconstruct::standalone(params, &phases, &canvas, p.t) else {
                continue;
            };
            samples.push(TrackingSample {
                t: p.t,
                x: p.x,
                y: p.y,
                target_x: r.target_x,
                target_y: r.target_y,
                pert_x: r.pert_x,
                pert_y: r.pert_y,
            });
        }

        let pulses: Vec<PulseWindow> = params
            .pulses
            .iter()
            .enumerate()
            .map(|(index, p)| PulseWindow {
                index,
                start_ms: phases.tracking_start + p.at_ms,
                amp_x: p.amp_x,
                amp_y: p.amp_y,
                hold_ms: params.pulse_hold_ms,
                return_ms: params.pulse_return_ms,
            })
            .collect();
        let flashes: Vec<FlashWindow> = params
            .cog
            .flashes
            .iter()
            .map(|f| FlashWindow {
                at_ms: phases.dualtask_start + f.at_ms,
                is_target: f.is_target,
            })
            .collect();

        let input_method = sub.input_method.unwrap_or_default();
        let report = analysis::run(&AnalysisInput {
            samples: &samples,
            accel: sub.accel.as_deref(),
            probes: &params.probes,
            pulses: &pulses,
            flashes: &flashes,
            cog_answer: sub.cog_answer,
            true_target_count: Some(params.cog.target_count),
        });
        let card = self.policy.score(&report, input_method);
        let verified = card.verdict_class == VerdictClass::Biological;

        self.finish(
            &challenge, card, verified, input_method, meta, now_ms, None,
            report.sample_rate_hz, report.sample_count,
        )
    }

    pub fn verify_embed(
        &self,
        sub: &EmbedSubmission,
        meta: &RequestMeta,
        now_ms: u64,
    ) -> Result<VerifyResponse, ApiError> {
        let claims: TokenClaims =
            token::verify_claims(&self.cfg.secret, &sub.token).ok_or(ApiError::InvalidToken)?;
        self.store
            .precheck(&claims.challenge_id, Mode::Embed, now_ms)?;

        if sub.pointer.len() < MIN_POINTER_EMBED {
            return Err(ApiError::InsufficientPointerData);
        }
        if sub.elements.is_empty() {
            return Err(ApiError::MissingElements);
        }

        let challenge = self.store.consume(&claims.challenge_id, now_ms)?;
        let ChallengeBody::Embed(params) = &challenge.body else {
            return Err(ApiError::WrongChallengeMode);
        };

        let rects: BTreeMap<usize, Rect> =
            sub.elements.iter().map(|e| (e.index, e.rect)).collect();

        // Analysis runs on the hover axis: only samples that advance hover
        // time carry perturbation information.
        let mut samples: Vec<TrackingSample> = Vec::with_capacity(sub.pointer.len());
        let mut last_hover = f64::NEG_INFINITY;
        for p in &sub.pointer {
            if !(p.hover_t.is_finite() && p.x.is_finite() && p.y.is_finite()) {
                continue;
            }
            if p.hover_t <= last_hover {
                continue;
            }
            let Some(rect) = rects.get(&p.element_idx) else {
                continue;
            };
            last_hover = p.hover_t;
            let r = reconstruct::embed(params, p.hover_t);
            let (cx, cy) = rect.center();
            samples.push(TrackingSample {
                t: p.hover_t,
                x: p.x,
                y: p.y,
                target_x: cx + r.pert_x,
                target_y: cy + r.pert_y,
                pert_x: r.pert_x,
                pert_y: r.pert_y,
            });
        }

        let pulses: Vec<PulseWindow> = params
            .pulses
            .iter()
            .enumerate()
            .map(|(index, p)| PulseWindow {
                index,
                start_ms: p.at_ms,
                amp_x: p.amp_x,
                amp_y: p.amp_y,
                hold_ms: params.pulse_hold_ms,
                return_ms: params.pulse_return_ms,
            })
            .collect();

        let input_method = sub.input_method.unwrap_or_default();
        let report = analysis::run(&AnalysisInput {
            samples: &samples,
            accel: sub.accel.as_deref(),
            probes: &params.probes,
            pulses: &pulses,
            flashes: &[],
            cog_answer: None,
            true_target_count: None,
        });
        let card = self.policy.score(&report, input_method);
        let verified = card.overall >= self.policy.embed_verified_floor;

        // Hover accounting: the intervals are authoritative when they
        // disagree materially with the reported cumulative hover time.
        let recomputed: f64 = sub
            .hovers
            .iter()
            .map(|h| (h.end_wall - h.start_wall).max(0.0))
            .sum();
        let reported = samples.last().map(|s| s.t).unwrap_or(0.0);
        let hover_time_ms = if recomputed > 0.0
            && (recomputed - reported).abs() / recomputed > HOVER_DISAGREEMENT
        {
            recomputed
        } else {
            reported
        };
        let unique_elements = {
            let mut seen: Vec<usize> = sub.hovers.iter().map(|h| h.element_idx).collect();
            seen.sort_unstable();
            seen.dedup();
            seen.len()
        };
        let min_hover = if input_method == InputMethod::Touch {
            MIN_HOVER_TOUCH_MS
        } else {
            MIN_HOVER_MS
        };
        let plausible = unique_elements >= 2
            && hover_time_ms >= min_hover
            && sub.pulse_log.len() >= MIN_PULSE_LOG;

        let embed_info = EmbedSessionInfo {
            hover_time_ms,
            unique_elements,
            plausible,
        };

        self.finish(
            &challenge, card, verified, input_method, meta, now_ms,
            Some(embed_info), report.sample_rate_hz, report.sample_count,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        challenge: &Challenge,
        card: Scorecard,
        verified: bool,
        input_method: InputMethod,
        meta: &RequestMeta,
        now_ms: u64,
        embed: Option<EmbedSessionInfo>,
        sample_rate_hz: f64,
        sample_count: usize,
    ) -> Result<VerifyResponse, ApiError> {
        let session_id = generate::random_id();
        let verified_at: DateTime<Utc> = Utc::now();

        let record = SessionRecord {
            id: session_id.clone(),
            verified_at,
            mode: challenge.mode(),
            challenge_id: challenge.id.clone(),
            input_method,
            score: card.overall,
            verdict: card.verdict.clone(),
            verdict_class: card.verdict_class,
            metrics: card.metrics.clone(),
            sample_rate_hz,
            sample_count,
            valid_metric_count: card.valid_metric_count,
            ip_hash: token::ip_hash(&self.cfg.secret, &meta.ip),
            user_agent: meta.user_agent.clone(),
            embed: embed.clone(),
        };
        if let Err(err) = self.sink.append(&record) {
            tracing::warn!(error = %err, session = %session_id, "session log append failed");
        }

        let receipt = token::sign_claims(
            &self.cfg.secret,
            &ReceiptClaims {
                challenge_id: challenge.id.clone(),
                mode: challenge.mode(),
                verified,
                score: card.overall,
                verdict: card.verdict.clone(),
                verified_at: now_ms,
            },
        )
        .map_err(|_| ApiError::AnalysisFailed)?;

        Ok(VerifyResponse {
            ok: true,
            session_id,
            score: card.overall,
            verdict: card.verdict,
            verdict_class: card.verdict_class,
            verified,
            receipt,
            embed,
        })
    }
}
