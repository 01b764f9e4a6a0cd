//! Command handler for the shell

use lrucache::LruCache;
use tracing::debug;

use crate::command::Command;
use crate::reply::Reply;

pub struct CommandHandler {
    cache: LruCache<String, String>,
}

impl CommandHandler {
    pub fn new(cache: LruCache<String, String>) -> Self {
        Self { cache }
    }

    pub fn handle(&mut self, cmd: Command) -> Reply {
        debug!(?cmd, "handling command");

        match cmd {
            Command::Ping(None) => Reply::Status("PONG".to_string()),
            Command::Ping(Some(msg)) => Reply::Bulk(msg),
            Command::Get(key) => bulk_or_nil(self.cache.get(&key)),
            Command::Peek(key) => bulk_or_nil(self.cache.peek(&key)),
            Command::Set(key, value) => {
                self.cache.set(key, value);
                Reply::Ok
            }
            Command::Del(keys) => {
                let removed = keys
                    .iter()
                    .filter(|key| self.cache.remove(key.as_str()).is_some())
                    .count();
                Reply::Integer(removed as i64)
            }
            Command::Exists(keys) => {
                let present = keys
                    .iter()
                    .filter(|key| self.cache.contains_key(key.as_str()))
                    .count();
                Reply::Integer(present as i64)
            }
            Command::Keys => Reply::Array(self.cache.iter().map(|(k, _)| k.clone()).collect()),
            Command::DbSize => Reply::Integer(self.cache.len() as i64),
            Command::FlushDb => {
                self.cache.clear();
                Reply::Ok
            }
            Command::Info => self.handle_info(),
            Command::Quit => Reply::Ok,
        }
    }

    fn handle_info(&self) -> Reply {
        let stats = self.cache.stats();
        let info = format!(
            "# Cache\n\
             cache_size:{}\n\
             cache_capacity:{}\n\
             \n\
             # Stats\n\
             cache_hits:{}\n\
             cache_misses:{}\n\
             cache_hit_ratio:{:.2}\n\
             cache_inserts:{}\n\
             cache_updates:{}\n\
             cache_evictions:{}",
            self.cache.len(),
            self.cache.capacity(),
            stats.hits(),
            stats.misses(),
            stats.hit_ratio(),
            stats.inserts(),
            stats.updates(),
            stats.evictions(),
        );
        Reply::Status(info)
    }
}

fn bulk_or_nil(value: Option<&String>) -> Reply {
    match value {
        Some(v) => Reply::Bulk(v.clone()),
        None => Reply::Nil,
    }
}
