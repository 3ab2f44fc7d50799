// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background jobs for translation requests.
//!
//! Each request runs on its own thread and reports back over a channel that
//! the UI polls once per frame, so pointer interaction never waits on the
//! network. Results carry the bubble ids they belong to; the editor decides
//! whether they are still relevant when they arrive. Every job is also tagged
//! with the document it was started for, and results for an earlier document
//! are dropped on arrival.

use super::{
    ChainOutcome, ChainTranslation, Detection, RegionTranslation, ServiceError,
    TranslationService,
};
use crate::editor::linker::ChainRequest;
use crate::models::bubble::BubbleId;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Result of a finished background request.
#[derive(Debug)]
pub enum JobResult {
    Scan(Result<Vec<Detection>, ServiceError>),
    Region {
        id: BubbleId,
        result: Result<RegionTranslation, ServiceError>,
    },
    Chains(Vec<ChainOutcome>),
}

/// A result tagged with the document generation that requested it.
#[derive(Debug)]
struct Tagged {
    generation: u64,
    result: JobResult,
}

/// Spawns translation requests and collects their results.
pub struct JobRunner {
    service: Arc<dyn TranslationService>,
    target_language: String,
    sender: Sender<Tagged>,
    receiver: Receiver<Tagged>,
    generation: u64,
    scan_in_flight: bool,
    chains_in_flight: bool,
    regions_in_flight: usize,
}

impl JobRunner {
    pub fn new(service: Arc<dyn TranslationService>, target_language: impl Into<String>) -> Self {
        let (sender, receiver) = channel();
        Self {
            service,
            target_language: target_language.into(),
            sender,
            receiver,
            generation: 0,
            scan_in_flight: false,
            chains_in_flight: false,
            regions_in_flight: 0,
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn set_target_language(&mut self, language: impl Into<String>) {
        self.target_language = language.into();
    }

    /// Forget every outstanding job, e.g. after a new image is opened.
    /// Their results are discarded when they arrive.
    pub fn start_document(&mut self) {
        let abandoned = self.outstanding();
        self.generation += 1;
        self.scan_in_flight = false;
        self.chains_in_flight = false;
        self.regions_in_flight = 0;
        if abandoned > 0 {
            log::info!("Abandoned {} requests for the previous image", abandoned);
        }
    }

    /// Send `result` back to the UI thread from a worker.
    fn reply(&self) -> impl FnOnce(JobResult) + Send + 'static {
        let sender = self.sender.clone();
        let generation = self.generation;
        move |result| {
            let _ = sender.send(Tagged { generation, result });
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_in_flight
    }

    pub fn is_retranslating(&self) -> bool {
        self.chains_in_flight
    }

    pub fn outstanding(&self) -> usize {
        self.regions_in_flight + usize::from(self.scan_in_flight) + usize::from(self.chains_in_flight)
    }

    /// Start a full-image scan. Refused while another scan is outstanding.
    pub fn spawn_scan(&mut self, image_png: Vec<u8>) -> bool {
        if self.scan_in_flight {
            log::warn!("Scan already in progress, ignoring request");
            return false;
        }
        self.scan_in_flight = true;
        log::info!("Started scan ({} bytes, target {})", image_png.len(), self.target_language);
        let service = Arc::clone(&self.service);
        let language = self.target_language.clone();
        let reply = self.reply();
        std::thread::spawn(move || {
            reply(JobResult::Scan(service.detect(&image_png, &language)));
        });
        true
    }

    /// Translate a drawn region. Any number may be outstanding at once.
    pub fn spawn_region(&mut self, id: BubbleId, region_png: Vec<u8>) {
        self.regions_in_flight += 1;
        let service = Arc::clone(&self.service);
        let language = self.target_language.clone();
        let reply = self.reply();
        std::thread::spawn(move || {
            let result = service.translate_region(&region_png, &language);
            reply(JobResult::Region { id, result });
        });
        log::info!("Requested translation for bubble {}", id);
    }

    /// Retranslate every chain, each independently, and report them together.
    pub fn spawn_chains(&mut self, chains: Vec<ChainRequest>) -> bool {
        if self.chains_in_flight || chains.is_empty() {
            return false;
        }
        self.chains_in_flight = true;
        let service = Arc::clone(&self.service);
        let language = self.target_language.clone();
        let reply = self.reply();
        let count = chains.len();
        std::thread::spawn(move || {
            let outcomes = std::thread::scope(|scope| {
                let handles: Vec<_> = chains
                    .iter()
                    .map(|chain| {
                        let service = &service;
                        let language = &language;
                        scope.spawn(move || service.retranslate_chain(&chain.items, language))
                    })
                    .collect();
                chains
                    .iter()
                    .zip(handles)
                    .map(|(chain, handle)| ChainOutcome {
                        ids: chain.ids.clone(),
                        result: join_chain(handle),
                    })
                    .collect::<Vec<_>>()
            });
            reply(JobResult::Chains(outcomes));
        });
        log::info!("Started retranslation of {} chains", count);
        true
    }

    /// Collect every result that has arrived since the last poll.
    pub fn poll(&mut self) -> Vec<JobResult> {
        let arrived: Vec<Tagged> = self.receiver.try_iter().collect();
        arrived.into_iter().filter_map(|tagged| self.accept(tagged)).collect()
    }

    fn accept(&mut self, tagged: Tagged) -> Option<JobResult> {
        if tagged.generation != self.generation {
            log::debug!("Dropping result from a previous image");
            return None;
        }
        self.mark_done(&tagged.result);
        Some(tagged.result)
    }

    fn mark_done(&mut self, result: &JobResult) {
        match result {
            JobResult::Scan(_) => self.scan_in_flight = false,
            JobResult::Region { .. } => {
                self.regions_in_flight = self.regions_in_flight.saturating_sub(1)
            }
            JobResult::Chains(_) => self.chains_in_flight = false,
        }
    }

    /// Block until the next result for the current document arrives.
    /// Test helper.
    #[cfg(test)]
    fn wait(&mut self) -> JobResult {
        loop {
            let tagged = self
                .receiver
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("job did not finish in time");
            if let Some(result) = self.accept(tagged) {
                return result;
            }
        }
    }
}

fn join_chain(
    handle: std::thread::ScopedJoinHandle<'_, Result<Vec<ChainTranslation>, ServiceError>>,
) -> Result<Vec<ChainTranslation>, ServiceError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(ServiceError::Unavailable("retranslation worker panicked".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ChainItem;

    /// Scripted backend: one detection per image byte, echoes inputs and
    /// fails chains starting with "fail".
    struct StubService;

    impl TranslationService for StubService {
        fn detect(&self, image: &[u8], _lang: &str) -> Result<Vec<Detection>, ServiceError> {
            if image.is_empty() {
                return Err(ServiceError::Unavailable("no image".into()));
            }
            Ok(vec![Detection::default(); image.len()])
        }

        fn translate_region(
            &self,
            image: &[u8],
            lang: &str,
        ) -> Result<RegionTranslation, ServiceError> {
            Ok(RegionTranslation {
                translated_text: format!("{} bytes to {}", image.len(), lang),
                ..RegionTranslation::sentinel()
            })
        }

        fn retranslate_chain(
            &self,
            chain: &[ChainItem],
            _lang: &str,
        ) -> Result<Vec<ChainTranslation>, ServiceError> {
            if chain[0].current_text.starts_with("fail") {
                return Err(ServiceError::Status {
                    code: 500,
                    message: "boom".into(),
                });
            }
            Ok(chain
                .iter()
                .map(|item| ChainTranslation {
                    id: item.id,
                    translated_text: item.current_text.to_uppercase(),
                })
                .collect())
        }
    }

    fn runner() -> JobRunner {
        JobRunner::new(Arc::new(StubService), "en")
    }

    fn chain(ids: &[u64], text: &str) -> ChainRequest {
        let items: Vec<ChainItem> = ids
            .iter()
            .map(|&id| ChainItem {
                id: BubbleId(id),
                current_text: format!("{text} {id}"),
                original_text: None,
            })
            .collect();
        ChainRequest {
            ids: items.iter().map(|item| item.id).collect(),
            items,
        }
    }

    #[test]
    fn test_second_scan_is_refused_while_outstanding() {
        let mut jobs = runner();
        assert!(jobs.spawn_scan(vec![1, 2, 3]));
        assert!(!jobs.spawn_scan(vec![1, 2, 3]));
        assert!(jobs.is_scanning());

        match jobs.wait() {
            JobResult::Scan(Ok(detections)) => assert_eq!(detections.len(), 3),
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!jobs.is_scanning());
        assert!(jobs.spawn_scan(Vec::new()));
        assert!(matches!(jobs.wait(), JobResult::Scan(Err(ServiceError::Unavailable(_)))));
    }

    #[test]
    fn test_region_requests_run_concurrently() {
        let mut jobs = runner();
        jobs.spawn_region(BubbleId(1), vec![0; 4]);
        jobs.spawn_region(BubbleId(2), vec![0; 8]);
        assert_eq!(jobs.outstanding(), 2);

        let mut seen = Vec::new();
        for _ in 0..2 {
            match jobs.wait() {
                JobResult::Region { id, result } => seen.push((id, result.unwrap().translated_text)),
                other => panic!("unexpected result {other:?}"),
            }
        }
        seen.sort_by_key(|(id, _)| *id);
        assert_eq!(
            seen,
            vec![
                (BubbleId(1), "4 bytes to en".to_string()),
                (BubbleId(2), "8 bytes to en".to_string()),
            ]
        );
        assert_eq!(jobs.outstanding(), 0);
    }

    #[test]
    fn test_results_for_previous_image_are_dropped() {
        let mut jobs = runner();
        assert!(jobs.spawn_scan(vec![1, 2, 3]));
        jobs.spawn_region(BubbleId(1), vec![0; 4]);

        jobs.start_document();
        assert_eq!(jobs.outstanding(), 0);
        assert!(jobs.spawn_scan(vec![7]));

        let mut accepted = Vec::new();
        for _ in 0..3 {
            let tagged = jobs
                .receiver
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("job did not finish in time");
            accepted.extend(jobs.accept(tagged));
        }
        assert_eq!(accepted.len(), 1);
        match &accepted[0] {
            JobResult::Scan(Ok(detections)) => assert_eq!(detections.len(), 1),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(jobs.outstanding(), 0);
        assert!(jobs.poll().is_empty());
    }

    #[test]
    fn test_chain_failures_are_isolated() {
        let mut jobs = runner();
        assert!(!jobs.spawn_chains(Vec::new()));
        assert!(jobs.spawn_chains(vec![chain(&[1, 2], "ok"), chain(&[3, 4], "fail")]));

        let JobResult::Chains(outcomes) = jobs.wait() else {
            panic!("expected chain outcomes");
        };
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].ids, vec![BubbleId(1), BubbleId(2)]);
        assert_eq!(outcomes[0].result.as_ref().unwrap()[1].translated_text, "OK 2");
        assert!(outcomes[1].result.is_err());
        assert!(!jobs.is_retranslating());
    }
}
