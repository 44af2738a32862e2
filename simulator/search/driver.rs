//! Query injection.
//!
//! A batch of `count` queries with qids `1..=count`, injected `interval`
//! ticks apart starting at `start_time`. Each query enters the network as a
//! zero-delay delivery to its origin with `sender == origin`, exactly like a
//! query arriving from the outside.

use p2p_search::{
    Category, Message, MessageEnvelope, NodeId, Query, QueryId, Result, SearchStats, SimTime,
};
use rand::rngs::StdRng;
use rand::Rng;

use super::config::QueryBatchConfig;
use super::scheduler::EventQueue;

/// One query of the plan with its injection time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedQuery {
    pub time: SimTime,
    pub query: Query,
}

pub struct QueryDriver {
    config: QueryBatchConfig,
    pools: Vec<Category>,
}

impl QueryDriver {
    pub fn new(config: &QueryBatchConfig) -> Result<Self> {
        let mut pools = config
            .categories
            .iter()
            .map(|name| name.parse::<Category>())
            .collect::<Result<Vec<_>>>()?;
        if pools.is_empty() {
            pools = Category::ALL.to_vec();
        }

        Ok(Self {
            config: config.clone(),
            pools,
        })
    }

    /// Draw origins and keywords for the whole batch.
    pub fn plan(&self, num_nodes: usize, rng: &mut StdRng) -> Vec<PlannedQuery> {
        (0..self.config.count)
            .map(|i| {
                let qid = i as QueryId + 1;
                let time = self
                    .config
                    .start_time
                    .saturating_add((i as SimTime).saturating_mul(self.config.interval));
                let origin = match self.config.origin {
                    Some(origin) => origin,
                    None => rng.gen_range(0..num_nodes.max(1)) as NodeId,
                };
                let keyword = self.pick_keyword(rng);
                PlannedQuery {
                    time,
                    query: Query::new(qid, origin, keyword, self.config.ttl),
                }
            })
            .collect()
    }

    fn pick_keyword(&self, rng: &mut StdRng) -> String {
        if !self.config.keywords.is_empty() {
            let i = rng.gen_range(0..self.config.keywords.len());
            return self.config.keywords[i].clone();
        }
        let category = self.pools[rng.gen_range(0..self.pools.len())];
        let pool = category.keywords();
        pool[rng.gen_range(0..pool.len())].to_string()
    }

    /// Queue the planned queries and record their start times. Queries due
    /// after `end` are never injected and do not count.
    pub fn inject(
        plan: Vec<PlannedQuery>,
        queue: &mut EventQueue,
        stats: &mut SearchStats,
        end: Option<SimTime>,
    ) -> usize {
        let mut injected = 0;
        for planned in plan {
            if end.map_or(false, |end| planned.time > end) {
                log::debug!(
                    "qid {} planned at {} is past the end time, skipped",
                    planned.query.qid,
                    planned.time
                );
                continue;
            }

            let origin = planned.query.origin;
            log::debug!(
                "inject qid={} kw='{}' ttl={} at node {} t={}",
                planned.query.qid,
                planned.query.keyword,
                planned.query.ttl,
                origin,
                planned.time
            );
            stats.record_injection(planned.query.qid, planned.time);
            queue.schedule_at(
                planned.time,
                MessageEnvelope {
                    sender: origin,
                    receiver: origin,
                    delay: 0,
                    message: Message::Query(planned.query),
                },
            );
            injected += 1;
        }
        injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p2p_search::SearchError;
    use rand::SeedableRng;

    #[test]
    fn test_default_batch_is_the_single_league_query() {
        let driver = QueryDriver::new(&QueryBatchConfig::default()).unwrap();
        let plan = driver.plan(50, &mut StdRng::seed_from_u64(0));

        assert_eq!(plan.len(), 1);
        let q = &plan[0].query;
        assert_eq!(plan[0].time, 0);
        assert_eq!((q.qid, q.origin, q.sender), (1, 0, 0));
        assert_eq!(q.keyword, "league");
        assert_eq!((q.ttl, q.hops), (3, 0));
    }

    #[test]
    fn test_batch_spacing_and_random_origins() {
        let config = QueryBatchConfig {
            count: 5,
            start_time: 2,
            interval: 3,
            origin: None,
            keywords: Vec::new(),
            categories: vec!["games".to_string()],
            ..QueryBatchConfig::default()
        };
        let driver = QueryDriver::new(&config).unwrap();
        let plan = driver.plan(8, &mut StdRng::seed_from_u64(4));

        let times: Vec<_> = plan.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![2, 5, 8, 11, 14]);
        for (i, p) in plan.iter().enumerate() {
            assert_eq!(p.query.qid, i as QueryId + 1);
            assert!(p.query.origin < 8);
            assert_eq!(p.query.sender, p.query.origin);
            assert!(Category::Games.keywords().contains(&p.query.keyword.as_str()));
        }
    }

    #[test]
    fn test_plan_is_seeded() {
        let config = QueryBatchConfig {
            count: 10,
            origin: None,
            keywords: Vec::new(),
            ..QueryBatchConfig::default()
        };
        let driver = QueryDriver::new(&config).unwrap();
        let a = driver.plan(20, &mut StdRng::seed_from_u64(8));
        let b = driver.plan(20, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
    }

    #[test]
    fn test_plan_times_saturate() {
        let config = QueryBatchConfig {
            count: 3,
            start_time: 5,
            interval: SimTime::MAX,
            ..QueryBatchConfig::default()
        };
        let driver = QueryDriver::new(&config).unwrap();
        let times: Vec<_> = driver
            .plan(4, &mut StdRng::seed_from_u64(0))
            .iter()
            .map(|p| p.time)
            .collect();
        assert_eq!(times, vec![5, SimTime::MAX, SimTime::MAX]);
    }

    #[test]
    fn test_unknown_category() {
        let config = QueryBatchConfig {
            categories: vec!["cooking".to_string()],
            ..QueryBatchConfig::default()
        };
        assert!(matches!(QueryDriver::new(&config), Err(SearchError::UnknownCategory(_))));
    }

    #[test]
    fn test_inject_records_start_and_respects_end() {
        let config = QueryBatchConfig {
            count: 3,
            interval: 10,
            ..QueryBatchConfig::default()
        };
        let driver = QueryDriver::new(&config).unwrap();
        let plan = driver.plan(4, &mut StdRng::seed_from_u64(0));

        let mut queue = EventQueue::new();
        let mut stats = SearchStats::new();
        let injected = QueryDriver::inject(plan, &mut queue, &mut stats, Some(15));

        assert_eq!(injected, 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(stats.start_time(1), Some(0));
        assert_eq!(stats.start_time(2), Some(10));
        assert_eq!(stats.start_time(3), None);

        let first = queue.pop_due(None).unwrap();
        assert_eq!(first.envelope.receiver, 0);
        assert_eq!(first.envelope.sender, 0);
    }
}
