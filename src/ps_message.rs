use crate::ps_interface::{NodeId, QueryId};

/// One hop of a keyword search.
///
/// Never mutated: every forwarding hop produces a fresh instance through
/// [`Query::advance_hop`]. `sender` is the node that produced this hop and
/// is only used to avoid sending the query straight back, it is not a route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub qid: QueryId,
    pub origin: NodeId,
    pub sender: NodeId,
    pub keyword: String,
    /// hops remaining
    pub ttl: i32,
    /// hops already traveled
    pub hops: u32,
}

impl Query {
    pub fn new(qid: QueryId, origin: NodeId, keyword: impl Into<String>, ttl: i32) -> Self {
        Self {
            qid,
            origin,
            sender: origin,
            keyword: keyword.into(),
            ttl,
            hops: 0,
        }
    }

    /// The copy that `new_sender` hands to its next hop.
    pub fn advance_hop(&self, new_sender: NodeId) -> Query {
        Query {
            qid: self.qid,
            origin: self.origin,
            sender: new_sender,
            keyword: self.keyword.clone(),
            ttl: self.ttl - 1,
            hops: self.hops + 1,
        }
    }
}

/// Sent directly to the origin by every node holding at least one match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub qid: QueryId,
    pub responder: NodeId,
    pub hits: Vec<String>,
    // hop count of the query at match time, diagnostics only
    pub hops: u32,
}

impl Response {
    pub fn new(qid: QueryId, responder: NodeId, hits: Vec<String>, hops: u32) -> Self {
        Self {
            qid,
            responder,
            hits,
            hops,
        }
    }
}
