use crate::bridge::model::{AutoCalibrationQuery, BridgeModel, CalibrationRequest, DetectQuery};
use dartcore::interface::Frame;
use dartcore::ScoringSession;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{mpsc, watch};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

type Shared = Arc<RwLock<BridgeModel>>;

/// Upper bound on an uploaded frame, enough for 4K luminance.
const MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

fn ok(body: serde_json::Value) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
}

fn failure(status: StatusCode, detail: String) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "detail": detail })), status)
}

/// HTTP surface over one scoring session.
pub fn routes(
    session: Arc<ScoringSession>,
    model: Shared,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let session_filter = warp::any().map(move || session.clone());
    let model_filter = warp::any().map(move || model.clone());

    let status_route = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(session_filter.clone())
        .map(|session: Arc<ScoringSession>| match session.status() {
            Ok(status) => ok(json!(status)),
            Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        });

    let score_route = warp::path("score")
        .and(warp::path::end())
        .and(warp::get())
        .and(model_filter)
        .map(|model: Shared| {
            let guard = model.read().unwrap_or_else(PoisonError::into_inner);
            ok(json!(guard.latest))
        });

    let get_calibration = warp::path("calibration")
        .and(warp::path::end())
        .and(warp::get())
        .and(session_filter.clone())
        .map(|session: Arc<ScoringSession>| ok(json!(session.calibration())));

    let set_calibration = warp::path("calibration")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(session_filter.clone())
        .map(|request: CalibrationRequest, session: Arc<ScoringSession>| {
            match session.set_calibration(request.center_x, request.center_y, request.radius) {
                Ok(()) => ok(json!({ "status": "Calibration updated successfully" })),
                Err(err) => failure(StatusCode::BAD_REQUEST, err.to_string()),
            }
        });

    let auto_calibration = warp::path("auto_calibration")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<AutoCalibrationQuery>())
        .and(session_filter.clone())
        .map(|query: AutoCalibrationQuery, session: Arc<ScoringSession>| {
            session.set_auto_calibration(query.enable);
            let state = if query.enable { "enabled" } else { "disabled" };
            ok(json!({ "status": format!("Auto-calibration {} successfully", state) }))
        });

    let detect = warp::path("detect")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<DetectQuery>())
        .and(warp::body::content_length_limit(MAX_FRAME_BYTES))
        .and(warp::body::bytes())
        .and(session_filter.clone())
        .map(
            |query: DetectQuery, body: warp::hyper::body::Bytes, session: Arc<ScoringSession>| {
                let frame = match Frame::from_luma(
                    query.width,
                    query.height,
                    body.to_vec(),
                    query.frame_id,
                    query.timestamp,
                ) {
                    Ok(frame) => frame,
                    Err(err) => return failure(StatusCode::BAD_REQUEST, err.to_string()),
                };
                match session.process_frame(&frame) {
                    Ok(score) => ok(json!(score)),
                    Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
                }
            },
        );

    let reset = warp::path("reset")
        .and(warp::path::end())
        .and(warp::post())
        .and(session_filter)
        .map(|session: Arc<ScoringSession>| match session.reset_tracking() {
            Ok(()) => ok(json!({ "status": "Tracking reset" })),
            Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        });

    status_route
        .or(score_route)
        .or(get_calibration)
        .or(set_calibration)
        .or(auto_calibration)
        .or(detect)
        .or(reset)
        .with(warp::log("dartsim::http"))
}

/// Streams the session into `model` and serves HTTP until `shutdown` resolves.
pub async fn serve<F>(
    session: Arc<ScoringSession>,
    model: Shared,
    bind: SocketAddr,
    tick: std::time::Duration,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (update_tx, mut update_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);

    let stream = {
        let session = session.clone();
        tokio::spawn(async move { session.run_stream(tick, update_tx, stop_rx).await })
    };
    let publisher = {
        let model = model.clone();
        tokio::spawn(async move {
            while let Some(update) = update_rx.recv().await {
                model
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .publish(update);
            }
        })
    };

    let (addr, server) =
        warp::serve(routes(session, model)).try_bind_with_graceful_shutdown(bind, shutdown)?;
    log::info!("HTTP bridge listening on {}", addr);
    server.await;

    let _ = stop_tx.send(true);
    stream.await?;
    publisher.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::raster::paint_disk;
    use crate::generator::scene::{BACKGROUND_LEVEL, BOARD_LEVEL, DART_LEVEL};
    use crate::workflow::config::WorkflowConfig;
    use crate::workflow::runner::Runner;
    use dartcore::scoring::Calibration;

    fn fixture() -> (Arc<ScoringSession>, Shared) {
        let runner = Runner::new(WorkflowConfig::from_args(5, 0, false));
        let session = Arc::new(runner.build_session().unwrap());
        (session, Arc::new(RwLock::new(BridgeModel::default())))
    }

    #[tokio::test]
    async fn calibration_round_trip() {
        let (session, model) = fixture();
        let api = routes(session.clone(), model);

        let response = warp::test::request()
            .method("POST")
            .path("/calibration")
            .json(&json!({ "center_x": 600, "center_y": 340, "radius": 280 }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .method("GET")
            .path("/calibration")
            .reply(&api)
            .await;
        let body: Calibration = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, Calibration::new(600, 340, 280, false));
    }

    #[tokio::test]
    async fn invalid_calibration_is_rejected() {
        let (session, model) = fixture();
        let api = routes(session.clone(), model);

        let response = warp::test::request()
            .method("POST")
            .path("/calibration")
            .json(&json!({ "center_x": 600, "center_y": 340, "radius": 0 }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(session.calibration(), Calibration::new(640, 360, 300, false));
    }

    #[tokio::test]
    async fn auto_calibration_toggle_and_reset() {
        let (session, model) = fixture();
        let api = routes(session.clone(), model);

        let response = warp::test::request()
            .method("POST")
            .path("/auto_calibration?enable=true")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(session.calibration().auto_calibrate);

        let response = warp::test::request()
            .method("POST")
            .path("/reset")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(session.status().unwrap().active_tracks, 0);
    }

    fn board_with_dart(x: f32, y: f32) -> Vec<u8> {
        let mut pixels = ndarray::Array2::from_elem((720, 1280), BACKGROUND_LEVEL);
        paint_disk(&mut pixels, 640.0, 360.0, 300.0, BOARD_LEVEL);
        paint_disk(&mut pixels, x, y, 3.0, DART_LEVEL);
        pixels.iter().copied().collect()
    }

    #[tokio::test]
    async fn detect_scores_uploaded_frames() {
        let (session, model) = fixture();
        let api = routes(session.clone(), model);
        let body = board_with_dart(640.0, 183.0);

        let mut last = serde_json::Value::Null;
        for frame_id in 0..11 {
            let response = warp::test::request()
                .method("POST")
                .path(&format!("/detect?width=1280&height=720&frame_id={}", frame_id))
                .body(&body)
                .reply(&api)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            last = serde_json::from_slice(response.body()).unwrap();
        }
        assert_eq!(last["throws"][0]["section"]["label"], "T20");
        assert_eq!(last["total_score"], 60);
        assert_eq!(last["image_width"], 1280);
        assert_eq!(session.status().unwrap().frames_processed, 11);
    }

    #[tokio::test]
    async fn detect_rejects_malformed_frames() {
        let (session, model) = fixture();
        let api = routes(session.clone(), model);

        let response = warp::test::request()
            .method("POST")
            .path("/detect?width=1280&height=720")
            .body(vec![0u8; 100])
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .method("POST")
            .path("/detect?width=0&height=0")
            .body(Vec::<u8>::new())
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(session.status().unwrap().frames_processed, 0);
    }

    #[tokio::test]
    async fn score_reflects_published_update() {
        let (session, model) = fixture();
        let api = routes(session.clone(), model.clone());

        let response = warp::test::request().path("/score").reply(&api).await;
        assert_eq!(response.body().as_ref(), b"null");

        let update = session.process_next().unwrap();
        model.write().unwrap().publish(update);

        let response = warp::test::request().path("/score").reply(&api).await;
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["frame_id"], 0);
        assert_eq!(body["score"]["total_score"], 0);

        let response = warp::test::request().path("/status").reply(&api).await;
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["frames_processed"], 1);
    }
}
