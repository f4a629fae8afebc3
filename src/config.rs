/*!
Structs to hold configuration data and global variables.
*/
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::store::Store;

#[derive(Deserialize)]
struct ConfigFile {
    db_connect_string: Option<String>,
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug)]
pub struct Cfg {
    pub db_connect_string: String,
    pub addr: SocketAddr,
}

impl std::default::Default for Cfg {
    fn default() -> Self {
        Self {
            db_connect_string: "host=localhost user=registrar password='registrar' dbname=registrar".to_owned(),
            addr: SocketAddr::new(
                "0.0.0.0".parse().unwrap(),
                8001
            ),
        }
    }
}

impl Cfg {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let file_contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Unable to read config file: {}", &e))?;
        let cf: ConfigFile = toml::from_str(&file_contents)
            .map_err(|e| format!("Unable to deserialize config file: {}", &e))?;

        let mut c = Self::default();

        if let Some(s) = cf.db_connect_string {
            c.db_connect_string = s;
        }
        if let Some(s) = cf.host {
            c.addr.set_ip(
                s.parse().map_err(|e| format!(
                    "Error parsing {:?} as IP address: {}",
                    &s, &e
                ))?
            );
        }
        if let Some(n) = cf.port {
            c.addr.set_port(n);
        }

        Ok(c)
    }
}

/**
This guy holds the storage handle and gets passed in an
`axum::Extension` to the handlers who need him.
*/
#[derive(Debug)]
pub struct Glob {
    pub db: Store,
}

/// Opens the storage handle and ensures the database has all the
/// appropriate tables and its seed rows.
pub async fn load_configuration(cfg: &Cfg) -> Result<Glob, String> {
    log::trace!("Checking state of data DB...");
    let db = Store::new(cfg.db_connect_string.clone());
    if let Err(e) = db.ensure_db_schema().await {
        let estr = format!("Unable to ensure state of data DB: {}", &e);
        return Err(estr);
    }
    log::trace!("...data DB okay.");

    log::trace!("Checking presence of seed rows in data DB...");
    if let Err(e) = db.ensure_seed_data().await {
        let estr = format!("Unable to ensure seed data in data DB: {}", &e);
        return Err(estr);
    }
    log::trace!("...seed rows okay.");

    Ok(Glob { db })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    #[test]
    fn default_cfg() {
        ensure_logging();
        let c = Cfg::default();
        assert_eq!(c.addr.port(), 8001);
    }

    #[test]
    fn cfg_overlay() {
        ensure_logging();
        let c = Cfg::from_file("test/config.toml").unwrap();
        // Fields present in the file override defaults; the rest stay.
        assert_eq!(
            c.db_connect_string.as_str(),
            "host=localhost user=registrar_test password='registrar_test' dbname=registrar_test"
        );
        assert_eq!(c.addr.port(), 8002);
        assert_eq!(c.addr.ip(), Cfg::default().addr.ip());
    }
}
