use std::{num::NonZeroUsize, sync::Mutex};

use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, Utc};
use http::{header::COOKIE, HeaderMap};
use lru::LruCache;
use serde_json::{json, Value};
use tracing::debug;

use samlgate_auth::Session;
use samlgate_connect::Subject;
use samlgate_slo::{errors, Result};

use crate::config::PluginConfig;

/// CookieConfig renders and reads the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub max_age: i64,
}

impl CookieConfig {
    pub fn from_config(config: &PluginConfig) -> Self {
        Self {
            name: config.session_cookie.clone(),
            path: String::from("/"),
            secure: config.cookie_secure,
            max_age: config.session_ttl,
        }
    }

    pub fn build(&self, session_id: &str) -> String {
        self.render(session_id, self.max_age)
    }

    /// A cookie telling the browser to drop the session.
    pub fn expire(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, value, self.path);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; HttpOnly; SameSite=Lax");
        cookie.push_str(&format!("; Max-Age={}", max_age));
        cookie
    }

    /// Find the session id in the request's `Cookie` headers.
    pub fn parse(&self, headers: &HeaderMap) -> Option<String> {
        let prefix = format!("{}=", self.name);
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| header.split(';'))
            .find_map(|part| part.trim().strip_prefix(&prefix))
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }
}

#[derive(Debug)]
struct Entry {
    data: Value,
    expires_at: DateTime<Utc>,
}

/// SessionStore keeps session data in memory, bounded by an LRU and
/// expiring entries after the configured TTL.
#[derive(Debug)]
pub struct SessionStore {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    cookie: CookieConfig,
}

impl SessionStore {
    pub fn new(
        cache_size: usize,
        ttl_secs: i64,
        cookie: CookieConfig,
    ) -> anyhow::Result<Self> {
        let capacity = NonZeroUsize::new(cache_size)
            .context("session cache size must be greater than zero")?;
        let ttl = Duration::try_seconds(ttl_secs)
            .context("session ttl is out of range")?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            cookie,
        })
    }

    pub fn from_config(config: &PluginConfig) -> anyhow::Result<Self> {
        Self::new(
            config.cache_size,
            config.session_ttl,
            CookieConfig::from_config(config),
        )
    }

    pub fn cookie(&self) -> &CookieConfig {
        &self.cookie
    }

    /// Open the session named by the request's cookie. An unknown or
    /// expired id yields an empty session bound to no id.
    pub fn open(&self, headers: &HeaderMap) -> Result<SessionHandle> {
        let Some(id) = self.cookie.parse(headers) else {
            return Ok(SessionHandle::default());
        };
        let data = self.load(&id)?;
        Ok(SessionHandle {
            id: data.as_ref().map(|_| id),
            data,
            ..Default::default()
        })
    }

    /// Persist the handle's changes and return the `Set-Cookie` value to
    /// send, if any.
    pub fn commit(&self, handle: SessionHandle) -> Result<Option<String>> {
        if let Some(stale) = &handle.stale {
            debug!(session_id = %stale, "Session id rotated");
            self.remove(stale)?;
        }
        if handle.cleared && handle.data.is_none() {
            if let Some(id) = &handle.id {
                self.remove(id)?;
            }
            return Ok(Some(self.cookie.expire()));
        }
        if !handle.dirty {
            return Ok(None);
        }
        let Some(data) = handle.data else {
            return Ok(None);
        };
        let id = match handle.id {
            Some(id) => id,
            None => uuid::Uuid::new_v4().simple().to_string(),
        };
        self.save(&id, data)?;
        Ok(Some(self.cookie.build(&id)))
    }

    pub fn load(&self, id: &str) -> Result<Option<Value>> {
        let mut entries = self.lock()?;
        let expired = match entries.get(id) {
            Some(entry) if entry.expires_at > Utc::now() => {
                return Ok(Some(entry.data.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(session_id = id, "Session expired");
            entries.pop(id);
        }
        Ok(None)
    }

    pub fn save(&self, id: &str, data: Value) -> Result<()> {
        let entry = Entry {
            data,
            expires_at: Utc::now() + self.ttl,
        };
        self.lock()?.put(id.to_owned(), entry);
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.lock()?.pop(id);
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, LruCache<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|err| errors::anyhow(anyhow!("{err}")))
    }
}

/// SessionHandle is one request's view of its session.
#[derive(Debug, Default)]
pub struct SessionHandle {
    id: Option<String>,
    // id given up on login, dropped from the store on commit
    stale: Option<String>,
    data: Option<Value>,
    dirty: bool,
    cleared: bool,
}

impl SessionHandle {
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn principal(&self) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get("principal"))
    }

    /// The logged in user as the IdP knows them. Only principals carrying
    /// a `nameID` qualify.
    pub fn subject(&self) -> Option<Subject> {
        self.principal()
            .and_then(|principal| serde_json::from_value(principal.clone()).ok())
    }

    /// Store the authenticated principal. The session id presented with the
    /// request is never reused for it; a fresh one is minted on commit.
    pub fn login(&mut self, principal: Value, info: Option<Value>) {
        if let Some(id) = self.id.take() {
            self.stale = Some(id);
        }
        let mut data = json!({ "principal": principal });
        if let Some(info) = info {
            data["info"] = info;
        }
        self.data = Some(data);
        self.dirty = true;
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }
}

impl Session for SessionHandle {
    fn clear(&mut self) {
        self.data = None;
        self.dirty = false;
        self.cleared = true;
    }
}
