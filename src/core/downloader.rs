//! Main downloader implementation

use crate::core::quality::quality_label;
use crate::core::{
    BatchResult, EnhancedMedia, MediaCollection, MediaData, MediaKind, PhotoCollection,
    PhotoItem, VideoItem,
};
use crate::download::{FileDownloader, Progress};
use crate::error::SnapError;
use crate::platform::{
    ClientType, Endpoints, Extractor, HttpClient, HttpClientConfig, SnapsaveExtractor,
    SnaptikExtractor, TwitterExtractor, YouTubeExtractor,
};
use crate::utils::{
    ext_from_url, generate_clean_filename, is_image_mime, is_video_mime, is_youtube_page,
    mime_from_ext, CacheStatus, Platform, ResponseCache, DEFAULT_CACHE_TTL,
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main downloader configuration
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// HTTP timeout
    pub timeout: Duration,
    /// How long an extraction result is reused
    pub cache_ttl: Duration,
    /// User agent override
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Browser profile to emulate
    pub client_type: ClientType,
    /// Base URLs of the scraped front-ends
    pub endpoints: Endpoints,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cache_ttl: DEFAULT_CACHE_TTL,
            user_agent: None,
            proxy_url: None,
            client_type: ClientType::Chrome,
            endpoints: Endpoints::default(),
        }
    }
}

impl DownloadOptions {
    /// Set HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_client_type(mut self, client_type: ClientType) -> Self {
        self.client_type = client_type;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// Resolves post URLs into media and optionally saves them.
///
/// Cloning is cheap; clones share the extractors and the response cache.
#[derive(Clone)]
pub struct Downloader {
    options: DownloadOptions,
    extractors: Vec<Arc<dyn Extractor>>,
    cache: ResponseCache<MediaData>,
    files: FileDownloader,
}

impl Downloader {
    /// Create a new downloader with default options
    pub fn new() -> Result<Self, SnapError> {
        Self::with_options(DownloadOptions::default())
    }

    pub fn with_options(options: DownloadOptions) -> Result<Self, SnapError> {
        let http = HttpClient::with_config(HttpClientConfig {
            timeout: options.timeout,
            user_agent: options.user_agent.clone(),
            proxy_url: options.proxy_url.clone(),
            client_type: options.client_type,
        })?;

        let endpoints = &options.endpoints;
        let extractors: Vec<Arc<dyn Extractor>> = vec![
            Arc::new(SnapsaveExtractor::new(http.clone(), &endpoints.snapsave)),
            Arc::new(SnaptikExtractor::new(http.clone(), &endpoints.snaptik)),
            Arc::new(TwitterExtractor::new(http.clone(), &endpoints.twitter)),
            Arc::new(YouTubeExtractor::new(http.clone(), endpoints)),
        ];

        Ok(Self {
            cache: ResponseCache::new(options.cache_ttl),
            files: FileDownloader::new(http),
            extractors,
            options,
        })
    }

    /// Register an extractor that takes precedence over the built-in ones
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors.insert(0, Arc::new(extractor));
        self
    }

    /// Set progress callback for file downloads
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.files = self.files.with_progress_callback(callback);
        self
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Resolve a post URL into everything its extractor found.
    ///
    /// Results are cached per URL for the configured TTL.
    pub async fn fetch(&self, url: &str) -> Result<MediaData, SnapError> {
        if let Some(data) = self.cache.get(url).await {
            return Ok(data);
        }

        let platform =
            Platform::detect(url).ok_or_else(|| SnapError::InvalidUrl(url.to_string()))?;
        let extractor = self
            .extractors
            .iter()
            .find(|extractor| extractor.supports(platform))
            .ok_or_else(|| SnapError::InvalidUrl(url.to_string()))?;

        debug!("Using {} extractor for {} URL", extractor.name(), platform);
        let data = extractor.extract(url, platform).await?;
        info!("Resolved {} media items for {}", data.media.len(), url);

        self.cache.insert(url, data.clone()).await;
        Ok(data)
    }

    /// Best item of a post with the metadata needed to save it
    pub async fn enhanced_download(&self, url: &str) -> Result<EnhancedMedia, SnapError> {
        let platform = Platform::from_url_loose(url);
        let data = self.fetch(url).await?;

        let best = data.best_media().ok_or(SnapError::NoDownloadLinks)?;
        let download_url = best.url.clone().ok_or(SnapError::NoDownloadLinks)?;

        let highest = data
            .media
            .iter()
            .fold(best, |top, current| if current.quality > top.quality { current } else { top });

        let title_source = data
            .title
            .as_deref()
            .or(best.title.as_deref())
            .or(highest.title.as_deref())
            .unwrap_or("video");
        let filename = generate_clean_filename(title_source, highest.kind.as_str(), None);

        Ok(EnhancedMedia {
            title: data
                .title
                .clone()
                .or_else(|| best.title.clone())
                .unwrap_or_else(|| format!("{} Media", platform.name())),
            description: data.description.clone().unwrap_or_default(),
            duration: data
                .duration
                .clone()
                .or_else(|| best.duration.clone())
                .unwrap_or_default(),
            author: data
                .author
                .clone()
                .or_else(|| best.author.clone())
                .unwrap_or_default(),
            thumbnail: data
                .thumbnail
                .clone()
                .or_else(|| best.thumbnail.clone())
                .or_else(|| data.preview.clone())
                .unwrap_or_default(),
            preview: data.preview.clone().unwrap_or_default(),
            download_url,
            kind: best.kind,
            quality: best.quality,
            quality_label: best.quality_label.clone(),
            filename,
            platform: platform.name().to_string(),
        })
    }

    /// Run [`enhanced_download`](Self::enhanced_download) for every URL at once.
    ///
    /// A failing URL is counted and never aborts the others.
    pub async fn batch_download(&self, urls: &[String]) -> BatchResult {
        let results = join_all(urls.iter().map(|url| self.enhanced_download(url))).await;

        let mut successful = Vec::new();
        let mut failed = 0;
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(media) => successful.push(media),
                Err(e) => {
                    warn!("Batch item {} failed: {}", url, e);
                    failed += 1;
                }
            }
        }

        BatchResult { successful, failed }
    }

    /// Every photo of a post, e.g. an Instagram carousel
    pub async fn download_all_photos(&self, url: &str) -> Result<PhotoCollection, SnapError> {
        let data = self.fetch(url).await?;
        let photos = photo_items(&data);
        if photos.is_empty() {
            return Err(SnapError::NoPhotos);
        }

        let zip_filename = generate_clean_filename(
            &format!("{}_{}_photos", data.title.as_deref().unwrap_or("photos"), photos.len()),
            "zip",
            None,
        );

        Ok(PhotoCollection {
            title: data.title.clone().unwrap_or_else(|| "Photo Collection".to_string()),
            description: data.description.clone().unwrap_or_default(),
            author: data.author.clone().unwrap_or_default(),
            total_photos: photos.len(),
            photos,
            zip_filename,
        })
    }

    /// Every photo and video of a post
    pub async fn download_all_media(&self, url: &str) -> Result<MediaCollection, SnapError> {
        let data = self.fetch(url).await?;
        let photos = photo_items(&data);
        let videos = video_items(&data);
        if photos.is_empty() && videos.is_empty() {
            return Err(SnapError::NoMedia);
        }

        let total_items = photos.len() + videos.len();
        let zip_filename = generate_clean_filename(
            &format!("{}_{}_items", data.title.as_deref().unwrap_or("media"), total_items),
            "zip",
            None,
        );

        Ok(MediaCollection {
            title: data.title.clone().unwrap_or_else(|| "Media Collection".to_string()),
            description: data.description.clone().unwrap_or_default(),
            author: data.author.clone().unwrap_or_default(),
            total_items,
            photos,
            videos,
            zip_filename,
        })
    }

    /// Placeholder answer returned without touching the network.
    ///
    /// The real extraction runs on a background task and only warms the
    /// cache; its outcome is never reported back.
    pub fn get_download_info(&self, url: &str) -> EnhancedMedia {
        let platform = Platform::from_url_loose(url);

        let downloader = self.clone();
        let background_url = url.to_string();
        tokio::spawn(async move {
            if let Err(e) = downloader.enhanced_download(&background_url).await {
                debug!("Background refresh of {} failed: {}", background_url, e);
            }
        });

        EnhancedMedia {
            title: format!("{} Media", platform.name()),
            description: String::new(),
            duration: String::new(),
            author: String::new(),
            thumbnail: String::new(),
            preview: String::new(),
            download_url: String::new(),
            kind: MediaKind::Video,
            quality: 0,
            quality_label: quality_label(0).to_string(),
            filename: format!("{}_media.mp4", platform.key()),
            platform: platform.name().to_string(),
        }
    }

    /// Resolve the best item of a post and save it under `dir`
    pub async fn download_to(
        &self,
        url: &str,
        dir: &Path,
    ) -> Result<(EnhancedMedia, PathBuf), SnapError> {
        let media = self.enhanced_download(url).await?;
        if !media.download_url.starts_with("http") {
            return Err(SnapError::NoDownloadLinks);
        }
        if is_youtube_page(&media.download_url) {
            warn!("Refusing to save YouTube page {}", media.download_url);
            return Err(SnapError::YouTubeError(format!(
                "open {} in a browser to download the video",
                media.download_url
            )));
        }

        let filename = local_filename(&media);
        info!("Downloading {} as {}", media.title, filename);
        let path = self
            .files
            .download_to_dir(&media.download_url, dir, &filename)
            .await?;
        Ok((media, path))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }
}

fn photo_items(data: &MediaData) -> Vec<PhotoItem> {
    let title = data.title.as_deref().unwrap_or("photo");
    data.images()
        .enumerate()
        .filter(|(_, item)| item.has_http_url())
        .map(|(i, item)| PhotoItem {
            url: item.url.clone().unwrap_or_default(),
            filename: generate_clean_filename(&format!("{}_{}", title, i + 1), "image", Some("jpg")),
            index: i + 1,
            quality: if item.quality == 0 { 500 } else { item.quality },
            thumbnail: item_thumbnail(item.thumbnail.as_deref(), data),
        })
        .collect()
}

fn video_items(data: &MediaData) -> Vec<VideoItem> {
    let title = data.title.as_deref().unwrap_or("video");
    data.videos()
        .enumerate()
        .filter(|(_, item)| item.has_http_url())
        .map(|(i, item)| VideoItem {
            url: item.url.clone().unwrap_or_default(),
            filename: generate_clean_filename(&format!("{}_{}", title, i + 1), "video", Some("mp4")),
            index: i + 1,
            quality: if item.quality == 0 { 500 } else { item.quality },
            thumbnail: item_thumbnail(item.thumbnail.as_deref(), data),
            duration: item.duration.clone().unwrap_or_default(),
        })
        .collect()
}

fn item_thumbnail(own: Option<&str>, data: &MediaData) -> String {
    own.or(data.thumbnail.as_deref())
        .or(data.preview.as_deref())
        .unwrap_or_default()
        .to_string()
}

/// Filename to save under, using the URL's extension when it fits the kind
fn local_filename(media: &EnhancedMedia) -> String {
    let ext = match ext_from_url(&media.download_url) {
        Some(ext) => ext,
        None => return media.filename.clone(),
    };

    let mime = mime_from_ext(ext);
    let fits = match media.kind {
        MediaKind::Image => is_image_mime(mime),
        MediaKind::Video => is_video_mime(mime),
    };
    if fits {
        Path::new(&media.filename)
            .with_extension(ext)
            .to_string_lossy()
            .into_owned()
    } else {
        media.filename.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Media;
    use crate::platform::YouTubeVideoInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const POST: &str = "https://www.instagram.com/p/C1a2B3c4D5e/";

    /// Extractor answering every platform with canned data
    struct CannedExtractor {
        data: MediaData,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Extractor for CannedExtractor {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn supports(&self, _platform: Platform) -> bool {
            true
        }

        async fn extract(&self, _url: &str, _platform: Platform) -> Result<MediaData, SnapError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.clone())
        }
    }

    fn media(url: &str, kind: MediaKind, quality: u32) -> Media {
        Media::new(Some(url.to_string()), kind).with_quality(quality)
    }

    fn downloader_with(data: MediaData) -> (Downloader, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = DownloadOptions::default().with_endpoints(Endpoints::all_at("http://127.0.0.1:9"));
        let downloader = Downloader::with_options(options)
            .unwrap()
            .with_extractor(CannedExtractor {
                data,
                calls: Arc::clone(&calls),
            });
        (downloader, calls)
    }

    fn carousel() -> MediaData {
        MediaData {
            title: Some("Trip".to_string()),
            thumbnail: Some("https://cdn/thumb.jpg".to_string()),
            media: vec![
                media("https://cdn/1.jpg", MediaKind::Image, 500),
                media("javascript:void(0)", MediaKind::Image, 500),
                media("https://cdn/3.jpg", MediaKind::Image, 0),
                media("https://cdn/clip.mp4", MediaKind::Video, 720),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_download_options_builders() {
        let options = DownloadOptions::default()
            .with_timeout(Duration::from_secs(5))
            .with_cache_ttl(Duration::from_secs(1))
            .with_user_agent("snapdl-test")
            .with_client_type(ClientType::Firefox);

        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.cache_ttl, Duration::from_secs(1));
        assert_eq!(options.user_agent.as_deref(), Some("snapdl-test"));
        assert_eq!(options.client_type, ClientType::Firefox);
        assert!(options.proxy_url.is_none());
    }

    #[tokio::test]
    async fn test_fetch_uses_cache() {
        let (downloader, calls) = downloader_with(carousel());

        downloader.fetch(POST).await.unwrap();
        downloader.fetch(POST).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let status = downloader.cache_status();
        assert_eq!(status.total_entries, 1);
        assert_eq!(status.entries[0].key, POST);

        downloader.clear_cache();
        downloader.fetch(POST).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_urls() {
        let (downloader, calls) = downloader_with(carousel());

        let err = downloader.fetch("https://example.com/video/1").await.unwrap_err();
        assert!(matches!(err, SnapError::InvalidUrl(_)));
        assert_eq!(err.user_message(), "Invalid URL");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enhanced_download() {
        let data = MediaData {
            title: Some("Sunset".to_string()),
            preview: Some("https://cdn/preview.jpg".to_string()),
            media: vec![
                media("https://cdn/sd.mp4", MediaKind::Video, 360),
                media("https://cdn/hd.mp4", MediaKind::Video, 720),
            ],
            ..Default::default()
        };
        let (downloader, _) = downloader_with(data);

        let result = downloader.enhanced_download(POST).await.unwrap();
        assert_eq!(result.title, "Sunset");
        assert_eq!(result.download_url, "https://cdn/hd.mp4");
        assert_eq!(result.quality, 720);
        assert_eq!(result.filename, "Sunset.mp4");
        assert_eq!(result.platform, "Instagram");
        assert_eq!(result.thumbnail, "https://cdn/preview.jpg");
        assert_eq!(result.kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_enhanced_download_without_url() {
        let data = MediaData {
            media: vec![Media::new(None, MediaKind::Video)],
            ..Default::default()
        };
        let (downloader, _) = downloader_with(data);

        let err = downloader.enhanced_download(POST).await.unwrap_err();
        assert!(matches!(err, SnapError::NoDownloadLinks));
        assert_eq!(err.user_message(), "No download links found");
    }

    #[tokio::test]
    async fn test_batch_download_counts_failures() {
        let (downloader, _) = downloader_with(carousel());
        let urls = vec![POST.to_string(), "not a url".to_string()];

        let batch = downloader.batch_download(&urls).await;
        assert_eq!(batch.successful.len(), 1);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.message().as_deref(), Some("1 downloads failed"));
    }

    #[tokio::test]
    async fn test_download_all_photos() {
        let (downloader, _) = downloader_with(carousel());

        let collection = downloader.download_all_photos(POST).await.unwrap();
        assert_eq!(collection.title, "Trip");
        assert_eq!(collection.total_photos, 2);
        assert_eq!(collection.zip_filename, "Trip_2_photos.zip");

        assert_eq!(collection.photos[0].filename, "Trip_1.jpg");
        assert_eq!(collection.photos[1].index, 3);
        assert_eq!(collection.photos[1].filename, "Trip_3.jpg");
        assert_eq!(collection.photos[1].quality, 500);
        assert_eq!(collection.photos[1].thumbnail, "https://cdn/thumb.jpg");
    }

    #[tokio::test]
    async fn test_download_all_photos_on_video_post() {
        let data = MediaData {
            media: vec![media("https://cdn/clip.mp4", MediaKind::Video, 720)],
            ..Default::default()
        };
        let (downloader, _) = downloader_with(data);

        let err = downloader.download_all_photos(POST).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "No photos found. This might be a video-only post."
        );
    }

    #[tokio::test]
    async fn test_download_all_media() {
        let (downloader, _) = downloader_with(carousel());

        let collection = downloader.download_all_media(POST).await.unwrap();
        assert_eq!(collection.total_items, 3);
        assert_eq!(collection.videos.len(), 1);
        assert_eq!(collection.videos[0].filename, "Trip_1.mp4");
        assert_eq!(collection.zip_filename, "Trip_3_items.zip");

        let (empty, _) = downloader_with(MediaData::default());
        let err = empty.download_all_media(POST).await.unwrap_err();
        assert!(matches!(err, SnapError::NoMedia));
    }

    #[tokio::test]
    async fn test_get_download_info_warms_cache() {
        let (downloader, calls) = downloader_with(carousel());

        let info = downloader.get_download_info("https://x.com/someone/status/1790000000000000000");
        assert_eq!(info.title, "Twitter/X Media");
        assert_eq!(info.filename, "twitter_media.mp4");
        assert_eq!(info.quality, 0);

        for _ in 0..50 {
            if calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_download_to_saves_best_media() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/hd.mp4")
            .with_body("video-bytes")
            .create_async()
            .await;

        let data = MediaData {
            title: Some("Sunset".to_string()),
            media: vec![
                media(&format!("{}/hd.mp4", server.url()), MediaKind::Video, 720),
                media("https://cdn/cover.jpg", MediaKind::Image, 1080),
            ],
            ..Default::default()
        };
        let (downloader, _) = downloader_with(data);

        let dir = TempDir::new().unwrap();
        let (media, path) = downloader.download_to(POST, dir.path()).await.unwrap();

        // the highest scored item is the cover image, the saved file is the video
        assert_eq!(media.filename, "Sunset.jpg");
        assert_eq!(path, dir.path().join("Sunset.mp4"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "video-bytes");
    }

    #[tokio::test]
    async fn test_download_to_refuses_youtube_pages() {
        let data = YouTubeVideoInfo::fallback("dQw4w9WgXcQ").into_media_data();
        let (downloader, _) = downloader_with(data);

        let dir = TempDir::new().unwrap();
        let err = downloader
            .download_to("https://youtu.be/dQw4w9WgXcQ", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, SnapError::YouTubeError(_)));
        assert!(err.user_message().contains("watch?v=dQw4w9WgXcQ"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_local_filename_keeps_kind() {
        let mut media = EnhancedMedia {
            title: "t".into(),
            description: String::new(),
            duration: String::new(),
            author: String::new(),
            thumbnail: String::new(),
            preview: String::new(),
            download_url: "https://cdn/photo.png".into(),
            kind: MediaKind::Image,
            quality: 0,
            quality_label: String::new(),
            filename: "t.jpg".into(),
            platform: "Instagram".into(),
        };
        assert_eq!(local_filename(&media), "t.png");

        media.download_url = "https://d.rapidcdn.app/v2?token=abc".into();
        assert_eq!(local_filename(&media), "t.jpg");
    }
}
