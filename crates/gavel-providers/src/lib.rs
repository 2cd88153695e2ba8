//! Gavel Providers
//!
//! External provider facade: one uniform call/response contract over the
//! heterogeneous read-only REST providers (dictionary, encyclopedia, weather,
//! media search, URL shortening, TTS, recipes). Every call is a single
//! best-effort request with no retry and no circuit breaking; that is a
//! deliberate limitation of this facade. "No such resource" answers are
//! distinguished from transport failures so the bot can reply "not found"
//! instead of a generic error.

use gavel_config::{key_or_placeholder, ProviderKeys};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered, and says the resource does not exist.
    #[error("resource not found")]
    NotFound,
    /// The provider rejected the credentials (including the placeholder key).
    #[error("provider rejected credentials")]
    Unauthorized,
    /// The provider answered with a body this facade cannot interpret.
    #[error("malformed provider response: {0}")]
    Malformed(String),
    /// Transport failure or an unexpected non-2xx status.
    #[error("provider request failed: {0}")]
    Network(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

// ------------------------------------------------------------------
// Payloads
// ------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub word: String,
    pub part_of_speech: String,
    pub definition: String,
    pub example: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WikiSummary {
    pub title: String,
    pub extract: String,
    pub thumbnail: Option<String>,
    pub disambiguation: bool,
}

#[derive(Debug, Clone)]
pub struct UrbanDefinition {
    pub definition: String,
    pub example: String,
}

#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub description: String,
    pub humidity: i64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone)]
pub struct MovieInfo {
    pub title: String,
    pub year: String,
    pub imdb_rating: String,
    pub genre: String,
    pub director: String,
    pub plot: String,
    pub poster: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VideoHit {
    pub title: String,
    pub channel: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RecipeHit {
    pub label: String,
    pub url: String,
    pub calories: i64,
}

// ------------------------------------------------------------------
// Endpoints
// ------------------------------------------------------------------

/// Base URLs for every provider, overridable in tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub dictionary: String,
    pub wikipedia: String,
    pub urban: String,
    pub openweather: String,
    pub omdb: String,
    pub youtube: String,
    pub tikmate: String,
    pub tikmate_download: String,
    pub isgd: String,
    pub voicerss: String,
    pub vevioz: String,
    pub dog: String,
    pub cataas: String,
    pub facts: String,
    pub edamam: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            dictionary: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
            wikipedia: "https://en.wikipedia.org/api/rest_v1/page/summary".to_string(),
            urban: "https://api.urbandictionary.com/v0/define".to_string(),
            openweather: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            omdb: "https://www.omdbapi.com/".to_string(),
            youtube: "https://www.googleapis.com/youtube/v3/search".to_string(),
            tikmate: "https://api.tikmate.io/api/convert".to_string(),
            tikmate_download: "https://tikmate.io/download".to_string(),
            isgd: "https://is.gd/create.php".to_string(),
            voicerss: "https://api.voicerss.org/".to_string(),
            vevioz: "https://api.vevioz.com/api/button/mp3".to_string(),
            dog: "https://dog.ceo/api/breeds/image/random".to_string(),
            cataas: "https://cataas.com".to_string(),
            facts: "https://uselessfacts.jsph.pl/random.json".to_string(),
            edamam: "https://api.edamam.com/search".to_string(),
        }
    }
}

// ------------------------------------------------------------------
// Facade
// ------------------------------------------------------------------

pub struct Providers {
    client: Client,
    keys: ProviderKeys,
    endpoints: Endpoints,
}

impl Providers {
    pub fn new(keys: ProviderKeys) -> Self {
        Self::with_endpoints(keys, Endpoints::default())
    }

    pub fn with_endpoints(keys: ProviderKeys, endpoints: Endpoints) -> Self {
        Self {
            client: Client::new(),
            keys,
            endpoints,
        }
    }

    // -------------------- lookups --------------------

    pub async fn dictionary(&self, word: &str) -> ProviderResult<DictionaryEntry> {
        let url = format!(
            "{}/{}",
            self.endpoints.dictionary,
            urlencode(word)
        );
        let value = self.get_json(&url, &[]).await?;
        parse_dictionary(&value, word)
    }

    pub async fn wiki_summary(&self, query: &str) -> ProviderResult<WikiSummary> {
        let url = format!("{}/{}", self.endpoints.wikipedia, urlencode(query));
        let value = self.get_json(&url, &[]).await?;
        parse_wiki(&value)
    }

    pub async fn urban(&self, term: &str) -> ProviderResult<UrbanDefinition> {
        let value = self
            .get_json(&self.endpoints.urban, &[("term", term)])
            .await?;
        parse_urban(&value)
    }

    pub async fn weather(&self, city: &str) -> ProviderResult<WeatherReport> {
        let key = key_or_placeholder(&self.keys.openweather_api_key);
        let value = self
            .get_json(
                &self.endpoints.openweather,
                &[("q", city), ("appid", key), ("units", "metric")],
            )
            .await?;
        parse_weather(&value)
    }

    pub async fn movie(&self, title: &str) -> ProviderResult<MovieInfo> {
        let key = key_or_placeholder(&self.keys.omdb_api_key);
        let value = self
            .get_json(&self.endpoints.omdb, &[("t", title), ("apikey", key)])
            .await?;
        parse_movie(&value)
    }

    pub async fn youtube_search(&self, query: &str) -> ProviderResult<Vec<VideoHit>> {
        let key = key_or_placeholder(&self.keys.youtube_api_key);
        let value = self
            .get_json(
                &self.endpoints.youtube,
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("maxResults", "5"),
                    ("type", "video"),
                    ("key", key),
                ],
            )
            .await?;
        parse_youtube(&value)
    }

    pub async fn tiktok_download(&self, video_url: &str) -> ProviderResult<String> {
        let value = self
            .get_json(&self.endpoints.tikmate, &[("url", video_url)])
            .await?;
        parse_tiktok(&value, &self.endpoints.tikmate_download)
    }

    pub async fn shorten_url(&self, long_url: &str) -> ProviderResult<String> {
        let value = self
            .get_json(&self.endpoints.isgd, &[("format", "json"), ("url", long_url)])
            .await?;
        value
            .get("shorturl")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed("missing 'shorturl' field".to_string()))
    }

    pub async fn recipes(&self, dish: &str) -> ProviderResult<Vec<RecipeHit>> {
        let app_id = key_or_placeholder(&self.keys.edamam_app_id);
        let app_key = key_or_placeholder(&self.keys.edamam_app_key);
        let value = self
            .get_json(
                &self.endpoints.edamam,
                &[("q", dish), ("app_id", app_id), ("app_key", app_key), ("to", "3")],
            )
            .await?;
        parse_recipes(&value)
    }

    pub async fn random_fact(&self) -> ProviderResult<String> {
        let value = self
            .get_json(&self.endpoints.facts, &[("language", "en")])
            .await?;
        value
            .get("text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed("missing 'text' field".to_string()))
    }

    pub async fn random_dog(&self) -> ProviderResult<String> {
        let value = self.get_json(&self.endpoints.dog, &[]).await?;
        value
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed("missing 'message' field".to_string()))
    }

    pub async fn random_cat(&self) -> ProviderResult<String> {
        let url = format!("{}/cat", self.endpoints.cataas);
        let value = self.get_json(&url, &[("json", "true")]).await?;
        let path = value
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Malformed("missing 'url' field".to_string()))?;
        if path.starts_with("http") {
            Ok(path.to_string())
        } else {
            Ok(format!("{}{}", self.endpoints.cataas, path))
        }
    }

    // -------------------- link builders (no request) --------------------

    /// VoiceRSS synthesizes on GET, so the voice message carries the request
    /// URL itself and the platform fetches the audio.
    pub fn tts_url(&self, text: &str) -> String {
        let key = key_or_placeholder(&self.keys.voicerss_api_key);
        format!(
            "{}?key={}&hl=en-us&src={}",
            self.endpoints.voicerss,
            urlencode(key),
            urlencode(text)
        )
    }

    pub fn audio_download_url(&self, query: &str) -> String {
        format!("{}/{}", self.endpoints.vevioz, urlencode(query))
    }

    // -------------------- plumbing --------------------

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> ProviderResult<serde_json::Value> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        debug!(%url, status = status.as_u16(), "provider response");
        match status {
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Unauthorized)
            }
            s if !s.is_success() => {
                return Err(ProviderError::Network(format!("HTTP {}", s.as_u16())))
            }
            _ => {}
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// ------------------------------------------------------------------
// Response parsing, split out for unit tests
// ------------------------------------------------------------------

fn parse_dictionary(value: &serde_json::Value, word: &str) -> ProviderResult<DictionaryEntry> {
    let meaning = value
        .get(0)
        .and_then(|entry| entry.get("meanings"))
        .and_then(|m| m.get(0))
        .ok_or(ProviderError::NotFound)?;
    let part_of_speech = meaning
        .get("partOfSpeech")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();
    let first = meaning
        .get("definitions")
        .and_then(|d| d.get(0))
        .ok_or_else(|| ProviderError::Malformed("missing 'definitions' array".to_string()))?;
    let definition = first
        .get("definition")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::Malformed("missing 'definition' field".to_string()))?
        .to_string();
    let example = first
        .get("example")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Ok(DictionaryEntry {
        word: word.to_string(),
        part_of_speech,
        definition,
        example,
    })
}

fn parse_wiki(value: &serde_json::Value) -> ProviderResult<WikiSummary> {
    let title = value
        .get("title")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::Malformed("missing 'title' field".to_string()))?
        .to_string();
    let extract = value
        .get("extract")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let thumbnail = value
        .get("thumbnail")
        .and_then(|t| t.get("source"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let disambiguation = value
        .get("type")
        .and_then(|v| v.as_str())
        .is_some_and(|t| t == "disambiguation");
    Ok(WikiSummary {
        title,
        extract,
        thumbnail,
        disambiguation,
    })
}

fn parse_urban(value: &serde_json::Value) -> ProviderResult<UrbanDefinition> {
    let first = value
        .get("list")
        .and_then(|l| l.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing 'list' array".to_string()))?
        .first()
        .ok_or(ProviderError::NotFound)?;
    Ok(UrbanDefinition {
        definition: first
            .get("definition")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        example: first
            .get("example")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
    })
}

fn parse_weather(value: &serde_json::Value) -> ProviderResult<WeatherReport> {
    let main = value
        .get("main")
        .ok_or_else(|| ProviderError::Malformed("missing 'main' object".to_string()))?;
    let temp_c = main
        .get("temp")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ProviderError::Malformed("missing 'temp' field".to_string()))?;
    Ok(WeatherReport {
        city: value
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("?")
            .to_string(),
        country: value
            .get("sys")
            .and_then(|s| s.get("country"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        temp_c,
        feels_like_c: main.get("feels_like").and_then(|v| v.as_f64()).unwrap_or(temp_c),
        description: value
            .get("weather")
            .and_then(|w| w.get(0))
            .and_then(|w| w.get("description"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        humidity: main.get("humidity").and_then(|v| v.as_i64()).unwrap_or(0),
        wind_speed: value
            .get("wind")
            .and_then(|w| w.get("speed"))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
    })
}

fn parse_movie(value: &serde_json::Value) -> ProviderResult<MovieInfo> {
    // OMDb reports misses inside a 200 body.
    if value.get("Response").and_then(|v| v.as_str()) == Some("False") {
        return Err(ProviderError::NotFound);
    }
    let field = |name: &str| -> String {
        value
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or("N/A")
            .to_string()
    };
    let poster = value
        .get("Poster")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty() && *p != "N/A")
        .map(str::to_string);
    Ok(MovieInfo {
        title: field("Title"),
        year: field("Year"),
        imdb_rating: field("imdbRating"),
        genre: field("Genre"),
        director: field("Director"),
        plot: field("Plot"),
        poster,
    })
}

fn parse_youtube(value: &serde_json::Value) -> ProviderResult<Vec<VideoHit>> {
    let items = value
        .get("items")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing 'items' array".to_string()))?;
    let hits: Vec<VideoHit> = items
        .iter()
        .filter_map(|item| {
            let video_id = item.get("id")?.get("videoId")?.as_str()?;
            let snippet = item.get("snippet")?;
            Some(VideoHit {
                title: snippet.get("title")?.as_str()?.to_string(),
                channel: snippet
                    .get("channelTitle")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                url: format!("https://youtu.be/{}", video_id),
            })
        })
        .collect();
    if hits.is_empty() {
        return Err(ProviderError::NotFound);
    }
    Ok(hits)
}

fn parse_tiktok(value: &serde_json::Value, download_base: &str) -> ProviderResult<String> {
    if value.get("error").and_then(|v| v.as_bool()).unwrap_or(false) {
        return Err(ProviderError::NotFound);
    }
    let token = value
        .get("token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::Malformed("missing 'token' field".to_string()))?;
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::Malformed("missing 'id' field".to_string()))?;
    Ok(format!("{}/{}/{}.mp4", download_base, token, id))
}

fn parse_recipes(value: &serde_json::Value) -> ProviderResult<Vec<RecipeHit>> {
    let hits = value
        .get("hits")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing 'hits' array".to_string()))?;
    if hits.is_empty() {
        return Err(ProviderError::NotFound);
    }
    Ok(hits
        .iter()
        .filter_map(|hit| {
            let recipe = hit.get("recipe")?;
            Some(RecipeHit {
                label: recipe.get("label")?.as_str()?.to_string(),
                url: recipe
                    .get("url")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                calories: recipe
                    .get("calories")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0)
                    .round() as i64,
            })
        })
        .collect())
}
