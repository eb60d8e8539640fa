//! Map Tile Client
//! Fetches the static background image for the incident map from the map
//! provider and places it in web-mercator plot space.
//!
//! Failures stay inside the map panel: the caller shows markers on a plain
//! background and a notice instead of the tile.

use image::GenericImageView;
use reqwest::blocking::Client;
use std::f64::consts::PI;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROVIDER_URL: &str = "https://api.mapbox.com/styles/v1/mapbox";
/// Pixel width of one world tile at zoom 0 for the provider's vector styles.
pub const TILE_SIZE: f64 = 512.0;
/// Largest static image the provider serves.
pub const MAX_IMAGE_SIZE: u32 = 1280;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum MapTileError {
    #[error("map token is not configured")]
    MissingToken,
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("map server responded with {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode map image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Project `(lat, lon)` to web-mercator world pixels at `zoom`.
///
/// `y` grows southward, as in tile space.
pub fn project(lat: f64, lon: f64, zoom: u8) -> [f64; 2] {
    let world = TILE_SIZE * f64::from(1_u32 << zoom.min(22));
    let lat_rad = lat.clamp(-85.051_128, 85.051_128).to_radians();
    let x = (lon + 180.0) / 360.0 * world;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world;
    [x, y]
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let world = TILE_SIZE * f64::from(1_u32 << zoom.min(22));
    let lon = x / world * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / world);
    let lat = n.sinh().atan().to_degrees();
    (lat, lon)
}

/// Plot-space position of a coordinate: mercator pixels with north up.
pub fn plot_position(lat: f64, lon: f64, zoom: u8) -> [f64; 2] {
    let [x, y] = project(lat, lon, zoom);
    [x, -y]
}

/// One static image request around a center point.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub zoom: u8,
    pub style: String,
    pub width: u32,
    pub height: u32,
}

impl TileRequest {
    pub fn new(center: (f64, f64), zoom: u8, style: &str) -> Self {
        Self {
            center,
            zoom,
            style: style.to_string(),
            width: MAX_IMAGE_SIZE,
            height: MAX_IMAGE_SIZE * 3 / 4,
        }
    }

    /// Provider URL for this request. The token is appended as a query value.
    pub fn url(&self, base: &str, token: &str) -> String {
        let (lat, lon) = self.center;
        format!(
            "{base}/{style}/static/{lon:.6},{lat:.6},{zoom}/{w}x{h}?access_token={token}",
            style = self.style,
            zoom = self.zoom,
            w = self.width,
            h = self.height,
        )
    }

    /// Center of the image in plot space.
    pub fn plot_center(&self) -> [f64; 2] {
        plot_position(self.center.0, self.center.1, self.zoom)
    }
}

/// A decoded tile ready to upload as a texture.
#[derive(Clone)]
pub struct MapTile {
    pub request: TileRequest,
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for MapTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapTile")
            .field("request", &self.request)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Blocking HTTP client for the static map provider.
pub struct MapTileClient {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl MapTileClient {
    pub fn new(token: Option<String>) -> Result<Self, MapTileError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            token,
            base_url: DEFAULT_PROVIDER_URL.to_string(),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Download and decode the image for `request`.
    pub fn fetch(&self, request: &TileRequest) -> Result<MapTile, MapTileError> {
        let token = self.token.as_deref().ok_or(MapTileError::MissingToken)?;
        let url = request.url(&self.base_url, token);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(MapTileError::Status(response.status()));
        }
        let bytes = response.bytes()?;

        let dynamic = image::load_from_memory(&bytes)?;
        let (width, height) = dynamic.dimensions();
        log::info!(
            "Loaded {width}x{height} map tile at ({:.4}, {:.4}) zoom {}",
            request.center.0,
            request.center.1,
            request.zoom
        );

        Ok(MapTile {
            request: request.clone(),
            size: [width as usize, height as usize],
            rgba: dynamic.into_rgba8().into_raw(),
        })
    }

    /// Fetch on a background thread; the result arrives on the returned channel.
    pub fn spawn_fetch(
        client: &Arc<Self>,
        request: TileRequest,
    ) -> Receiver<Result<MapTile, MapTileError>> {
        let (tx, rx) = channel();
        let client = Arc::clone(client);

        thread::spawn(move || {
            let _ = tx.send(client.fetch(&request));
        });

        rx
    }
}
