use hashbrown::HashSet;
use rand::rngs::StdRng;

use crate::ps_files::{generate_peer, FileGenConfig};
use crate::ps_forward::ForwardingStrategy;
use crate::ps_interface::{
    Event, EventSink, Message, MessageEnvelope, Neighborhood, NodeId, QueryId, SimTime,
};
use crate::ps_message::{Query, Response};
use crate::ps_peer::Peer;
use crate::ps_stats::SearchStats;

/// Everything a node may touch while handling one delivery besides its own
/// state. Built by the driver for each event.
pub struct SearchContext<'a> {
    /// current virtual time
    pub time: SimTime,
    pub links: &'a dyn Neighborhood,
    pub rng: &'a mut StdRng,
    pub stats: &'a mut SearchStats,
    pub sink: &'a mut dyn EventSink,
    /// delay for every envelope this node produces
    pub forward_delay: SimTime,
}

/// Protocol state of one node: dedup memory, local store and its
/// forwarding policy.
///
/// Not `Clone`: every node is created empty through [`SearchNode::new`] so
/// no two nodes can ever share a `seen` set or a store.
pub struct SearchNode {
    id: NodeId,
    seen: HashSet<QueryId>,
    store: Option<Peer>,
    strategy: Box<dyn ForwardingStrategy>,
}

impl SearchNode {
    pub fn new(id: NodeId, strategy: Box<dyn ForwardingStrategy>) -> Self {
        Self {
            id,
            seen: HashSet::new(),
            store: None,
            strategy,
        }
    }

    pub fn get_node_id(&self) -> NodeId {
        self.id
    }

    pub fn store(&self) -> Option<&Peer> {
        self.store.as_ref()
    }

    /// Attach a store built elsewhere. Keeps an existing one.
    pub fn set_store(&mut self, peer: Peer) {
        if self.store.is_none() {
            self.store = Some(peer);
        }
    }

    pub fn has_seen(&self, qid: QueryId) -> bool {
        self.seen.contains(&qid)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Generate the local store on first contact; later calls are no-ops
    /// and draw nothing from `rng`.
    pub fn on_simulation_start(&mut self, rng: &mut StdRng, files: &FileGenConfig) -> &Peer {
        let id = self.id;
        self.store.get_or_insert_with(|| generate_peer(id, rng, files))
    }

    /// Files matching `keyword` in the local store; empty without a store.
    pub fn search_local(&self, keyword: &str) -> &[String] {
        self.store.as_ref().map(|p| p.search(keyword)).unwrap_or(&[])
    }

    /*
    Query cases:

        qid already seen            -> ignore
        local match                 -> respond to origin, stop here
        no match, ttl exhausted     -> drop
        no match, ttl left          -> ask the forwarding strategy

    The ttl check comes after the local search: a node reached with ttl 0
    still answers, it just cannot forward.
     */
    pub fn handle_message(
        &mut self,
        msg: &MessageEnvelope,
        ctx: &mut SearchContext<'_>,
        responses: &mut Vec<MessageEnvelope>,
    ) {
        match &msg.message {
            Message::Response(response) => self.handle_response(response, ctx),
            Message::Query(query) => self.handle_query(query, ctx, responses),
        }
    }

    fn handle_response(&mut self, response: &Response, ctx: &mut SearchContext<'_>) {
        let first = ctx.stats.record_hit_received(response.qid, ctx.time);

        ctx.sink.log(
            ctx.time,
            self.id,
            Event::HitReceived {
                qid: response.qid,
                responder: response.responder,
                hops: response.hops,
                hits: response.hits.clone(),
                first,
                forwards: ctx.stats.query_forwards,
                hits_sent: ctx.stats.hits_sent,
                hits_recv: ctx.stats.hits_received_at_origin,
            },
        );
    }

    fn handle_query(
        &mut self,
        query: &Query,
        ctx: &mut SearchContext<'_>,
        responses: &mut Vec<MessageEnvelope>,
    ) {
        if !self.seen.insert(query.qid) {
            ctx.sink.log(
                ctx.time,
                self.id,
                Event::DuplicateIgnored {
                    qid: query.qid,
                    from: query.sender,
                },
            );
            return;
        }

        let hits = self.search_local(&query.keyword).to_vec();

        ctx.sink.log(
            ctx.time,
            self.id,
            Event::QueryReceived {
                qid: query.qid,
                keyword: query.keyword.clone(),
                ttl: query.ttl,
                hops: query.hops,
                from: query.sender,
                hits: hits.len(),
            },
        );

        if !hits.is_empty() {
            let count = hits.len();
            ctx.stats.record_hit_sent();
            responses.push(MessageEnvelope {
                sender: self.id,
                receiver: query.origin,
                delay: ctx.forward_delay,
                message: Message::Response(Response::new(query.qid, self.id, hits, query.hops)),
            });
            ctx.sink.log(
                ctx.time,
                self.id,
                Event::HitSent {
                    qid: query.qid,
                    origin: query.origin,
                    hits: count,
                },
            );
            return;
        }

        if query.ttl <= 0 {
            ctx.sink.log(
                ctx.time,
                self.id,
                Event::QueryDropped {
                    qid: query.qid,
                    hops: query.hops,
                },
            );
            return;
        }

        for (target, next) in self.strategy.decide(self.id, query, ctx.links, ctx.rng) {
            ctx.stats.record_forward();
            ctx.sink.log(
                ctx.time,
                self.id,
                Event::QueryForwarded {
                    qid: next.qid,
                    to: target,
                    ttl: next.ttl,
                },
            );
            responses.push(MessageEnvelope {
                sender: self.id,
                receiver: target,
                delay: ctx.forward_delay,
                message: Message::Query(next),
            });
        }
    }
}
