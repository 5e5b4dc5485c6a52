use std::collections::HashMap;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use log::error;

use super::{KeyValueStore, ABSENT};
use crate::error::{Error, Result};

enum Request {
    Get { key: i32, reply: Sender<i32> },
    Put { key: i32, value: i32 },
}

/// A map owned by a single server thread and reached only through a
/// request channel.
///
/// Every operation is a message. A `put` is queued and returns at once; a
/// `get` waits for its reply. All requests share one queue and are served
/// in order, so a `get` queued after a `put` on the same key observes it.
pub struct ChannelMap {
    requests: Option<Sender<Request>>,
    server: Option<JoinHandle<()>>,
}

impl ChannelMap {
    pub fn new() -> Result<Self> {
        let (requests, incoming) = channel::unbounded();
        let server = thread::Builder::new()
            .name("intcache-channel-map".to_string())
            .spawn(move || serve(incoming))
            .map_err(|e| Error::ThreadSpawn(e.to_string()))?;
        Ok(ChannelMap {
            requests: Some(requests),
            server: Some(server),
        })
    }

    fn send(&self, request: Request) -> bool {
        match &self.requests {
            Some(requests) => requests.send(request).is_ok(),
            None => false,
        }
    }
}

fn serve(incoming: Receiver<Request>) {
    let mut entries = HashMap::new();
    for request in incoming.iter() {
        match request {
            Request::Get { key, reply } => {
                let _ = reply.send(entries.get(&key).copied().unwrap_or(ABSENT));
            }
            Request::Put { key, value } => {
                entries.insert(key, value);
            }
        }
    }
}

impl KeyValueStore for ChannelMap {
    fn get(&self, key: i32) -> i32 {
        let (reply, response) = channel::bounded(1);
        // a dead server answers nothing, which reads as absent
        if !self.send(Request::Get { key, reply }) {
            return ABSENT;
        }
        response.recv().unwrap_or(ABSENT)
    }

    fn put(&self, key: i32, value: i32) {
        if !self.send(Request::Put { key, value }) {
            error!("channel map server is gone, dropped put of key {}", key);
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

impl Drop for ChannelMap {
    fn drop(&mut self) {
        // closing the queue ends the server loop
        self.requests.take();
        if let Some(server) = self.server.take() {
            if server.join().is_err() {
                error!("channel map server panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn queued_puts_are_seen_by_later_gets() {
        let map = ChannelMap::new().unwrap();
        for key in 0..1_000 {
            map.put(key, key * 3);
        }
        assert_eq!(map.get(999), 2_997);
        assert_eq!(map.get(1_000), ABSENT);
    }

    #[test]
    fn serves_many_callers() {
        let map = Arc::new(ChannelMap::new().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|tid| {
                let map = Arc::clone(&map);
                std::thread::spawn(move || {
                    for key in (tid..4_000).step_by(4) {
                        map.put(key, key);
                        assert_eq!(map.get(key), key);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(map.get(3_999), 3_999);
    }
}
