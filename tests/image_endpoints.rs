use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image_service::features::image::{FontBook, ImageService};
use image_service::{AppConfig, AppState, build_app};
use resvg::usvg::fontdb;
use tower::ServiceExt;

fn test_app() -> Router {
    let mut config = AppConfig::default();
    config.static_files.enabled = false;
    let fonts = FontBook::from_database(fontdb::Database::new(), &config.render.font_family);
    let state = AppState::new(config.render.clone(), ImageService::new(fonts));
    build_app(state, &config)
}

/// 只加载仓库自带字体的应用（不依赖宿主机字体）
fn bundled_font_app() -> Router {
    let mut config = AppConfig::default();
    config.static_files.enabled = false;
    config.render.load_system_fonts = false;
    config.render.fonts_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/fonts").into();
    let fonts = FontBook::load(&config.render);
    assert!(fonts.face_count() > 0, "bundled font missing");
    let state = AppState::new(config.render.clone(), ImageService::new(fonts));
    build_app(state, &config)
}

async fn get(uri: &str) -> axum::response::Response {
    get_from(test_app(), uri).await
}

async fn get_from(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("request")
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

fn header_str<'a>(resp: &'a axum::response::Response, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// PNG IHDR 中的宽高
fn png_size(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n", "not a PNG");
    let w = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let h = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    (w, h)
}

#[tokio::test]
async fn avatar_defaults_to_200_square_png() {
    let resp = get("/avatar/foo.png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, "content-type"), "image/png");
    assert_eq!(
        header_str(&resp, "cache-control"),
        "public, immutable, max-age=31536000"
    );
    assert_eq!(png_size(&body_bytes(resp).await), (200, 200));
}

#[tokio::test]
async fn cover_defaults_to_200_by_250() {
    let resp = get("/cover/foo.png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_str(&resp, "cache-control"),
        "public, immutable, max-age=31536000"
    );
    assert_eq!(png_size(&body_bytes(resp).await), (200, 250));
}

#[tokio::test]
async fn explicit_dimensions_are_honoured() {
    let resp = get("/avatar/foo.png?width=64&height=32").await;
    assert_eq!(png_size(&body_bytes(resp).await), (64, 32));

    // 只给宽度时封面高度按 1.25 推导
    let resp = get("/cover/foo.png?width=400&author=Someone").await;
    assert_eq!(png_size(&body_bytes(resp).await), (400, 500));

    let resp = get("/cover/foo.png?width=100&height=30").await;
    assert_eq!(png_size(&body_bytes(resp).await), (100, 30));
}

#[tokio::test]
async fn extension_selects_encoder() {
    // Content-Type 回显小写扩展名
    for (uri, mime) in [
        ("/avatar/foo.jpg", "image/jpg"),
        ("/avatar/foo.JPEG", "image/jpeg"),
        ("/cover/foo.jpeg?author=bar", "image/jpeg"),
    ] {
        let resp = get(uri).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert_eq!(header_str(&resp, "content-type"), mime, "{uri}");
        assert_eq!(&body_bytes(resp).await[..3], &[0xFF, 0xD8, 0xFF], "{uri}");
    }

    let resp = get("/avatar/foo.webp").await;
    assert_eq!(header_str(&resp, "content-type"), "image/webp");
    let bytes = body_bytes(resp).await;
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    // 无法识别的扩展名输出 PNG 字节
    let resp = get("/avatar/foo.gif").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, "content-type"), "image/gif");
    png_size(&body_bytes(resp).await);
}

#[tokio::test]
async fn missing_extension_is_not_found() {
    for uri in ["/avatar/foo", "/avatar/foo.", "/cover/Dune?author=x"] {
        let resp = get(uri).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            header_str(&resp, "content-type"),
            "application/problem+json",
            "{uri}"
        );
    }
}

#[tokio::test]
async fn same_url_yields_identical_bytes() {
    let a = body_bytes(get("/cover/Dune.png?author=Frank%20Herbert").await).await;
    let b = body_bytes(get("/cover/Dune.png?author=Frank%20Herbert").await).await;
    assert_eq!(a, b);

    let other = body_bytes(get("/cover/Emma.png?author=Frank%20Herbert").await).await;
    assert_ne!(a, other);
}

#[tokio::test]
async fn percent_encoded_names_are_accepted() {
    let resp = get("/avatar/Jane%20Doe.png").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get("/avatar/%C3%89milie%20Zola.webp").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, "content-type"), "image/webp");
}

#[tokio::test]
async fn degenerate_names_still_render() {
    for uri in ["/avatar/.png", "/avatar/---.png", "/cover/%20.png?author=%20"] {
        let resp = get(uri).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn malformed_query_is_a_bad_request() {
    let resp = get("/avatar/foo.png?width=abc").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        header_str(&resp, header::CONTENT_TYPE.as_str()),
        "application/problem+json"
    );
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(v["status"], 400);
    assert_eq!(v["code"], "BAD_REQUEST");

    let resp = get("/cover/foo.png?height=-5").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_dimensions_fail_validation() {
    for uri in [
        "/avatar/foo.png?width=0",
        "/cover/foo.png?height=0",
        "/avatar/foo.png?width=5000",
        "/cover/foo.png?width=4000",
    ] {
        let resp = get(uri).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(v["code"], "VALIDATION_FAILED", "{uri}");
    }
}

#[tokio::test]
async fn ping_returns_timestamped_pong() {
    let resp = get("/ping").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header_str(&resp, "content-type").starts_with("text/plain"));
    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    let ts = body.strip_prefix("pong ").expect("pong prefix");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{body}");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let resp = get("/api-docs/openapi.json").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(v["paths"]["/avatar/{file}"].is_object());
    assert!(v["paths"]["/cover/{file}"].is_object());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let resp = get("/nope").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

/// 两张同尺寸 PNG 中像素不同的区域（左、上、右、下，闭区间）
fn diff_bounds(a: &[u8], b: &[u8]) -> Option<(u32, u32, u32, u32)> {
    let a = image::load_from_memory(a).unwrap().to_rgba8();
    let b = image::load_from_memory(b).unwrap().to_rgba8();
    assert_eq!(a.dimensions(), b.dimensions());
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pa) in a.enumerate_pixels() {
        if pa == b.get_pixel(x, y) {
            continue;
        }
        bounds = Some(match bounds {
            Some((l, t, r, btm)) => (l.min(x), t.min(y), r.max(x), btm.max(y)),
            None => (x, y, x, y),
        });
    }
    bounds
}

#[tokio::test]
async fn avatar_initials_are_drawn_inside_the_padded_box() {
    for name in ["Jane%20Doe", "x", "W"] {
        let uri = format!("/avatar/{name}.png");
        let with_text = body_bytes(get_from(bundled_font_app(), &uri).await).await;
        let background = body_bytes(get(&uri).await).await;

        let (l, t, r, b) = diff_bounds(&with_text, &background).expect("no glyphs drawn");
        // 10% 内边距：墨迹落在 [20, 180)，抗锯齿允许 1px
        assert!(l >= 19 && t >= 19 && r <= 180 && b <= 180, "{name}: {:?}", (l, t, r, b));
        // 拟合轴贴满可用框
        assert!(r - l >= 156 || b - t >= 156, "{name}: {:?}", (l, t, r, b));
        // 墨迹中心在画布中心
        let cx = (l + r) as f32 / 2.0;
        let cy = (t + b) as f32 / 2.0;
        assert!((cx - 99.5).abs() <= 1.5, "{name}: cx = {cx}");
        assert!((cy - 99.5).abs() <= 1.5, "{name}: cy = {cy}");
    }
}

#[tokio::test]
async fn cover_title_and_author_stay_inside_the_border() {
    let uri = "/cover/Dune.png?author=Frank%20Herbert";
    let with_text = body_bytes(get_from(bundled_font_app(), uri).await).await;
    let background = body_bytes(get(uri).await).await;

    let (l, t, r, b) = diff_bounds(&with_text, &background).expect("no glyphs drawn");
    assert!(t >= 19, "title top {t}");
    assert!(b <= 230, "author bottom {b}");
    assert!(l >= 12 && r <= 187, "{:?}", (l, r));
}

#[tokio::test]
async fn blank_title_still_draws_a_legible_author() {
    let uri = "/cover/.png?author=Frank%20Herbert";
    let with_text = body_bytes(get_from(bundled_font_app(), uri).await).await;
    let background = body_bytes(get(uri).await).await;

    let (_, t, _, b) = diff_bounds(&with_text, &background).expect("author not drawn");
    assert!(b <= 230, "author bottom {b}");
    assert!(b - t > 40, "author ink only {}px tall", b - t);
}
