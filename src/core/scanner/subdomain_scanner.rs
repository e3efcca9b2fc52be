// src/core/scanner/subdomain_scanner.rs

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::core::cancel::CancelToken;
use crate::core::error::ReconError;
use crate::core::knowledge_base::COMMON_WORDLIST;
use crate::core::models::{DnsRecords, EnumOptions, SubdomainResult};
use crate::core::runner;
use crate::core::scanner::dns_scanner::{self, DnsResolver, Resolve};
use crate::core::scanner::passive_scanner::{self, PassiveSource};
use crate::core::targets::subdomain_candidates;

/// Wordlist and passive-source subdomain enumerator.
///
/// Every candidate, wherever it came from, goes through the same resolver
/// and classification step.
pub struct SubdomainEnumerator {
    options: EnumOptions,
    resolver: Arc<dyn Resolve>,
    wordlist: Arc<Vec<String>>,
    sources: Vec<Arc<dyn PassiveSource>>,
}

impl SubdomainEnumerator {
    /// Validates `options` and wires the default resolver, wordlist and the
    /// passive sources the options enable.
    ///
    /// Fatal config problems are returned as `Err`. Non-fatal ones (clamped
    /// depth, a source that could not be built) come back next to the
    /// enumerator so the caller can report them.
    pub fn new(options: EnumOptions) -> Result<(Self, Vec<ReconError>), ReconError> {
        let (options, mut warnings) = options.validate()?;
        let (sources, source_errors) = passive_scanner::configured_sources(&options);
        warnings.extend(source_errors);

        let resolver: Arc<dyn Resolve> = Arc::new(DnsResolver::new(options.dns_timeout));
        let enumerator = Self {
            options,
            resolver,
            wordlist: Arc::new(COMMON_WORDLIST.iter().map(|w| w.to_string()).collect()),
            sources,
        };
        Ok((enumerator, warnings))
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_wordlist(mut self, wordlist: Vec<String>) -> Self {
        self.wordlist = Arc::new(wordlist);
        self
    }

    pub fn with_sources(mut self, sources: Vec<Arc<dyn PassiveSource>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn options(&self) -> &EnumOptions {
        &self.options
    }

    pub fn wordlist_len(&self) -> usize {
        self.wordlist.len()
    }

    /// Resolves one name, classifying failures by kind.
    pub async fn resolve_domain(&self, name: &str) -> Result<Vec<String>, ReconError> {
        self.resolver.lookup_host(name).await
    }

    /// Starts wordlist enumeration (recursive when enabled) and returns the
    /// result stream. The stream closes once every level has been resolved.
    pub fn start(&self, cancel: &CancelToken) -> mpsc::Receiver<SubdomainResult> {
        self.spawn_levels(None, cancel)
    }

    /// Starts the wordlist pass and the passive source queries together.
    ///
    /// Names reported by a source join the first level as soon as that source
    /// answers, sharing its deduplication. The returned task yields the
    /// source errors once every source has answered, failed or been
    /// cancelled; a failing source never holds back the wordlist candidates.
    pub fn start_with_sources(
        &self,
        cancel: &CancelToken,
    ) -> (mpsc::Receiver<SubdomainResult>, JoinHandle<Vec<ReconError>>) {
        let (batches, errors) =
            passive_scanner::spawn_harvest(&self.sources, &self.options.domain, cancel);
        (self.spawn_levels(batches, cancel), errors)
    }

    /// Resolves only the names reported by the passive sources.
    ///
    /// The call has failed when the returned error list is non-empty, but the
    /// results gathered from the healthy sources are always returned.
    pub async fn enumerate_with_sources(
        &self,
        cancel: &CancelToken,
    ) -> (Vec<SubdomainResult>, Vec<ReconError>) {
        let (names, errors) =
            passive_scanner::harvest(&self.sources, &self.options.domain, cancel).await;
        let (feed, queue) = mpsc::channel(names.len().max(1));
        for name in names {
            // Sized to hold every name.
            let _ = feed.try_send(name);
        }
        drop(feed);
        let rx = resolve_all(
            self.resolver.clone(),
            queue,
            self.options.concurrency,
            self.options.include_inactive,
            cancel.clone(),
        );
        (runner::collect(rx).await, errors)
    }

    /// Collects the DNS records of `domain` through the enumerator's resolver.
    pub async fn check_dns_records(&self, domain: &str, cancel: &CancelToken) -> DnsRecords {
        dns_scanner::check_dns_records(self.resolver.as_ref(), domain, cancel).await
    }

    /// Drives one runner pass per depth level. Level 1 probes the wordlist
    /// against the base domain plus every passive batch; each later level uses
    /// the active names of the previous one as new base domains. No name is
    /// probed twice.
    fn spawn_levels(
        &self,
        passive: Option<mpsc::Receiver<Vec<String>>>,
        cancel: &CancelToken,
    ) -> mpsc::Receiver<SubdomainResult> {
        let depth = self.options.effective_depth();
        let concurrency = self.options.concurrency;
        let include_inactive = self.options.include_inactive;
        let resolver = self.resolver.clone();
        let wordlist = self.wordlist.clone();
        let domain = self.options.domain.clone();
        let cancel = cancel.clone();
        let (tx, rx) = mpsc::channel(concurrency.max(1));

        info!(
            domain = %domain,
            depth,
            words = wordlist.len(),
            passive = passive.is_some(),
            "Starting subdomain enumeration."
        );

        tokio::spawn(async move {
            let mut seen: HashSet<String> = HashSet::new();
            let mut bases = vec![domain];
            let mut passive = passive;

            for level in 1..=depth {
                if cancel.is_cancelled() || (bases.is_empty() && passive.is_none()) {
                    break;
                }

                let mut pending: VecDeque<String> = VecDeque::new();
                for base in &bases {
                    for name in subdomain_candidates(wordlist.as_slice(), base) {
                        if seen.insert(name.clone()) {
                            pending.push_back(name);
                        }
                    }
                }
                debug!(level, bases = bases.len(), candidates = pending.len(), "Enumerating level.");

                let (feed, queue) = mpsc::channel(concurrency.max(1));
                let mut feed = Some(feed);
                let mut level_rx = resolve_all(
                    resolver.clone(),
                    queue,
                    concurrency,
                    include_inactive,
                    cancel.clone(),
                );
                let mut next = Vec::new();

                loop {
                    if pending.is_empty() && passive.is_none() {
                        // Closing the feed lets the level stream close.
                        feed = None;
                    }

                    tokio::select! {
                        batch = next_batch(&mut passive) => match batch {
                            Some(names) => {
                                let before = pending.len();
                                pending.extend(names.into_iter().filter(|n| seen.insert(n.clone())));
                                debug!(level, added = pending.len() - before, "Passive names queued.");
                            }
                            None => passive = None,
                        },
                        slot = reserve_slot(&feed), if !pending.is_empty() => match slot {
                            Some(slot) => {
                                if let Some(name) = pending.pop_front() {
                                    slot.send(name);
                                }
                            }
                            // The runner stopped admitting, nothing left to feed.
                            None => pending.clear(),
                        },
                        result = level_rx.recv() => match result {
                            Some(result) => {
                                if level < depth && result.is_active() {
                                    next.push(result.subdomain.clone());
                                }
                                if tx.send(result).await.is_err() {
                                    debug!("Result consumer went away, stopping enumeration.");
                                    return;
                                }
                            }
                            None => break,
                        },
                    }
                }
                bases = next;
            }
            debug!("Subdomain enumeration finished.");
        });

        rx
    }
}

/// Next batch of passive names, or never when there is no pending source.
async fn next_batch(passive: &mut Option<mpsc::Receiver<Vec<String>>>) -> Option<Vec<String>> {
    match passive {
        Some(batches) => batches.recv().await,
        None => std::future::pending().await,
    }
}

/// A free slot in the level's candidate queue, or `None` once the runner has
/// stopped taking candidates.
async fn reserve_slot(feed: &Option<mpsc::Sender<String>>) -> Option<mpsc::Permit<'_, String>> {
    match feed {
        Some(feed) => feed.reserve().await.ok(),
        None => None,
    }
}

/// Resolves every candidate pulled from `candidates` through the runner.
///
/// Names that resolve to at least one address are `Active`. Failures are
/// dropped, or reported as `Inactive` when `include_inactive` is set. A
/// lookup still running when `cancel` fires is abandoned and its candidate
/// dropped, since its status was never determined.
fn resolve_all(
    resolver: Arc<dyn Resolve>,
    candidates: mpsc::Receiver<String>,
    concurrency: usize,
    include_inactive: bool,
    cancel: CancelToken,
) -> mpsc::Receiver<SubdomainResult> {
    let lookup_cancel = cancel.clone();
    runner::run_stream(candidates, concurrency, cancel, move |name| {
        let resolver = resolver.clone();
        let cancel = lookup_cancel.clone();
        async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    trace!(name = %name, "Lookup abandoned by cancellation.");
                    return None;
                }
                outcome = resolver.lookup_host(&name) => outcome,
            };
            match outcome {
                Ok(ips) if !ips.is_empty() => {
                    debug!(name = %name, ips = ?ips, "Subdomain active.");
                    Some(SubdomainResult::active(name, ips))
                }
                Ok(_) => include_inactive.then(|| SubdomainResult::inactive(name)),
                Err(e) => {
                    trace!(name = %name, kind = %e.kind(), "Candidate did not resolve.");
                    include_inactive.then(|| SubdomainResult::inactive(name))
                }
            }
        }
    })
}
