use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "hypernucleus";
const APP_NAME: &str = "hypernucleus-server";
const PING_ATTEMPTS: u32 = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Where the catalog lives: parsed client options plus the database name.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the catalog collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`, defaulting the database name when none is given.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DB).to_owned(),
        })
    }

    /// Build a client and wait until the database answers a ping.
    pub(super) async fn open(&self) -> MongoResult<(Client, Database)> {
        let client = Client::with_options(self.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&self.database_name);

        let mut delay = FIRST_PING_DELAY;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => return Ok((client, database)),
                Err(source) if attempt >= PING_ATTEMPTS => {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    debug!(attempt, error = %err, database = %self.database_name, "MongoDB ping failed; retrying");
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_PING_DELAY);
                }
            }
        }
    }
}
