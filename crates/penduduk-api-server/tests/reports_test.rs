mod common;

use lopdf::Document;

use common::{admin, id16, kadus, seed, test_state, warga};
use penduduk_api_server::charts::{GROWTH_CHART, POPULATION_CHART, RELIGION_CHART};
use penduduk_api_server::models::Hamlet;
use penduduk_api_server::services::ServiceError;
use penduduk_api_server::utils::files::{Output, RenderedFile};

fn expect_file(output: Output) -> RenderedFile {
    match output {
        Output::File(file) => file,
        Output::Empty(msg) => panic!("expected a document, got message: {}", msg),
    }
}

fn page_count(file: &RenderedFile) -> usize {
    Document::load_mem(&file.bytes)
        .expect("valid pdf")
        .get_pages()
        .len()
}

#[tokio::test]
async fn test_family_card_is_written_to_reports_dir() {
    let (state, dir) = test_state().await;
    seed(&state).await;

    let file = expect_file(state.reports.family_card(&admin(), &id16(100)).await.unwrap());
    assert_eq!(file.file_name, format!("kk_{}.pdf", id16(100)));
    assert!(file.path.starts_with(dir.path()));
    assert!(file.path.is_file());
    assert_eq!(page_count(&file), 1);
}

#[tokio::test]
async fn test_family_card_outside_scope_reads_as_missing() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    match state
        .reports
        .family_card(&kadus(Hamlet::Dua), &id16(100))
        .await
        .unwrap()
    {
        Output::Empty(_) => {}
        Output::File(_) => panic!("card of another hamlet must not print"),
    }
}

#[tokio::test]
async fn test_all_family_cards_one_page_per_household() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let file = expect_file(state.reports.all_family_cards(&admin()).await.unwrap());
    assert_eq!(file.file_name, "semua_kk.pdf");
    assert_eq!(page_count(&file), 3);

    let file = expect_file(
        state
            .reports
            .hamlet_family_cards(&kadus(Hamlet::Satu), "SATU")
            .await
            .unwrap(),
    );
    assert_eq!(file.file_name, "kk_dusun_SATU.pdf");
    assert_eq!(page_count(&file), 2);
}

#[tokio::test]
async fn test_hamlet_printing_is_gated() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    assert!(matches!(
        state.reports.hamlet_roster(&kadus(Hamlet::Satu), "DUA").await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        state.reports.hamlet_family_cards(&warga(&id16(1)), "SATU").await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        state.reports.hamlet_roster(&admin(), "LIMA").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_rosters_and_statistics_render() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let file = expect_file(state.reports.roster(&admin()).await.unwrap());
    assert_eq!(file.file_name, "daftar_semua_penduduk.pdf");
    assert!(page_count(&file) >= 1);

    let file = expect_file(state.reports.hamlet_roster(&admin(), "DUA").await.unwrap());
    assert_eq!(file.file_name, "daftar_dusun_DUA.pdf");
    assert!(page_count(&file) >= 1);

    let file = expect_file(state.reports.statistics(&admin()).await.unwrap());
    assert_eq!(file.file_name, "statistik.pdf");
    assert!(page_count(&file) >= 1);
}

#[tokio::test]
async fn test_empty_registry_prints_nothing() {
    let (state, _dir) = test_state().await;

    assert!(matches!(
        state.reports.all_family_cards(&admin()).await.unwrap(),
        Output::Empty(_)
    ));
    assert!(matches!(
        state.reports.roster(&admin()).await.unwrap(),
        Output::Empty(_)
    ));
    assert!(state.reports.printable_hamlets(&admin()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_draws_charts() {
    let (state, dir) = test_state().await;
    seed(&state).await;

    let view = state.statistics.dashboard(&admin()).await.unwrap();
    assert_eq!(view.total_jiwa, 4);
    assert_eq!(view.total_kk, 3);
    assert!(view
        .charts
        .contains(&format!("/api/dashboard/chart/{}", POPULATION_CHART)));
    assert!(dir
        .path()
        .join("static/charts/u_admin")
        .join(RELIGION_CHART)
        .is_file());

    let chart = state
        .statistics
        .chart_image(&admin(), RELIGION_CHART)
        .await
        .unwrap();
    assert_eq!(chart.content_type, "image/png");
    assert!(chart.bytes.starts_with(b"\x89PNG"));

    assert!(matches!(
        state.statistics.chart_image(&admin(), "../settings.toml").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_dashboard_charts_are_kept_per_account() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    state.statistics.dashboard(&admin()).await.unwrap();
    let before = state
        .statistics
        .chart_image(&admin(), GROWTH_CHART)
        .await
        .unwrap()
        .bytes;

    state.statistics.dashboard(&warga(&id16(4))).await.unwrap();

    let after = state
        .statistics
        .chart_image(&admin(), GROWTH_CHART)
        .await
        .unwrap();
    assert_eq!(after.bytes, before);
    assert!(state
        .statistics
        .chart_image(&admin(), RELIGION_CHART)
        .await
        .is_ok());

    // never drawn for the resident
    assert!(matches!(
        state.statistics.chart_image(&warga(&id16(4)), RELIGION_CHART).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        state.statistics.chart_image(&kadus(Hamlet::Dua), GROWTH_CHART).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_dashboard_breakdowns_per_role() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let view = state.statistics.dashboard(&warga(&id16(4))).await.unwrap();
    assert_eq!(view.total_jiwa, 1);
    assert!(view.agama.is_empty());
    assert!(view.pendidikan.is_empty());
    assert!(view.penduduk_dusun.is_empty());
    assert_eq!(
        view.charts,
        vec![format!("/api/dashboard/chart/{}", GROWTH_CHART)]
    );

    let view = state.statistics.dashboard(&kadus(Hamlet::Satu)).await.unwrap();
    assert_eq!(view.total_jiwa, 3);
    assert!(view.penduduk_dusun.is_empty());
    assert!(!view.agama.is_empty());
    assert!(!view
        .charts
        .contains(&format!("/api/dashboard/chart/{}", POPULATION_CHART)));
}

#[tokio::test]
async fn test_statistics_breakdowns_per_role() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let view = state.statistics.statistics(&admin()).await.unwrap();
    assert_eq!(view.total_jiwa, 4);
    assert!(!view.dusun.is_empty());
    assert!(!view.agama.is_empty());

    let view = state.statistics.statistics(&kadus(Hamlet::Satu)).await.unwrap();
    assert_eq!(view.total_jiwa, 3);
    assert!(view.dusun.is_empty());
    assert!(!view.pendidikan.is_empty());

    let view = state.statistics.statistics(&warga(&id16(4))).await.unwrap();
    assert_eq!(view.total_jiwa, 1);
    assert!(view.agama.is_empty());
}

#[tokio::test]
async fn test_progress_is_admin_only_and_capped() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    assert!(matches!(
        state.statistics.progress(&kadus(Hamlet::Satu), None, None).await,
        Err(ServiceError::Forbidden(_))
    ));

    let view = state
        .statistics
        .progress(&admin(), Some("SATU"), Some("kemarin"))
        .await
        .unwrap();
    assert_eq!(view.total_terinput, 4);
    assert_eq!(view.total_target, 150 + 120 + 272 + 140);
    assert_eq!(view.warnings.len(), 1);
    let satu = view.progress.iter().find(|p| p.dusun == "SATU").unwrap();
    assert_eq!(satu.terinput, 3);
    assert_eq!(satu.target, 150);
    assert_eq!(satu.persen, 2);
}
