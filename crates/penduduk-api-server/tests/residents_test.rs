mod common;

use common::{admin, form, id16, kadus, seed, test_state, warga};
use penduduk_api_server::models::{Hamlet, ListParams, ListQuery, ListRows};
use penduduk_api_server::services::resident_service::{MSG_NIK_TAKEN, MSG_SECOND_HEAD};
use penduduk_api_server::services::ServiceError;

fn nik_view(search: Option<&str>) -> ListQuery {
    ListQuery::from(&ListParams {
        search: search.map(str::to_string),
        limit: Some("all".to_string()),
        page: None,
        view: Some("nik".to_string()),
    })
}

#[tokio::test]
async fn test_listing_is_scoped_per_role() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let page = state.residents.list(&admin(), &nik_view(None)).await.unwrap();
    assert_eq!(page.total_rows, 4);
    assert_eq!(page.counts.total_penduduk, 4);
    assert_eq!(page.counts.total_kk, 3);
    assert_eq!(page.counts.total_dusun, 2);

    let page = state
        .residents
        .list(&kadus(Hamlet::Satu), &nik_view(None))
        .await
        .unwrap();
    assert_eq!(page.total_rows, 3);
    assert_eq!(page.counts.total_dusun, 1);

    let page = state
        .residents
        .list(&warga(&id16(4)), &nik_view(None))
        .await
        .unwrap();
    assert_eq!(page.total_rows, 1);
    match page.rows {
        ListRows::Residents(rows) => assert_eq!(rows[0].nama, "ANI LESTARI"),
        ListRows::Households(_) => panic!("expected flat rows"),
    }
}

#[tokio::test]
async fn test_search_narrows_rows_but_not_header_counts() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let page = state
        .residents
        .list(&admin(), &nik_view(Some("BUDI")))
        .await
        .unwrap();
    assert_eq!(page.total_rows, 1);
    assert_eq!(page.counts.total_penduduk, 4);
}

#[tokio::test]
async fn test_household_view_groups_by_kk() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let query = ListQuery::from(&ListParams::default());
    let page = state.residents.list(&admin(), &query).await.unwrap();
    match page.rows {
        ListRows::Households(households) => {
            assert_eq!(households.len(), 3);
            let first = households
                .iter()
                .find(|h| h.nomor_kk == id16(100))
                .unwrap();
            assert_eq!(first.anggota.len(), 2);
            assert_eq!(first.kepala_keluarga.as_deref(), Some("BUDI SANTOSO"));
        }
        ListRows::Residents(_) => panic!("expected grouped rows"),
    }
}

#[tokio::test]
async fn test_create_rejects_duplicates_and_bad_input() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let dup = form(&id16(1), &id16(999), "ORANG LAIN", "Anak", "SATU");
    match state.residents.create(&admin(), &dup).await {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {:?}", other),
    }

    let bad = form("123", &id16(999), "budi", "Anak", "LIMA");
    match state.residents.create(&admin(), &bad).await {
        Err(ServiceError::Validation(e)) => assert_eq!(e.messages().len(), 3),
        other => panic!("expected validation error, got {:?}", other),
    }

    // rejected writes leave the store as seeded
    let kept = state.residents.get(&admin(), &id16(1)).await.unwrap();
    assert_eq!(kept.nama, "BUDI SANTOSO");
    assert_eq!(kept.nomor_kk, id16(100));
    assert!(matches!(
        state.residents.get(&admin(), "123").await,
        Err(ServiceError::NotFound(_))
    ));
    let page = state.residents.list(&admin(), &nik_view(None)).await.unwrap();
    assert_eq!(page.total_rows, 4);

    let other_hamlet = form(&id16(50), &id16(500), "RINA", "Kepala Keluarga", "DUA");
    match state.residents.create(&kadus(Hamlet::Satu), &other_hamlet).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {:?}", other),
    }

    let own = form(&id16(51), &id16(500), "RINA", "Kepala Keluarga", "SATU");
    match state.residents.create(&warga(&id16(1)), &own).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {:?}", other),
    }
}

#[tokio::test]
async fn test_second_head_is_a_warning() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let second = form(&id16(5), &id16(100), "AHMAD", "Kepala Keluarga", "SATU");
    let outcome = state.residents.create(&admin(), &second).await.unwrap();
    assert_eq!(outcome.warnings, vec![MSG_SECOND_HEAD.to_string()]);
    assert!(state.residents.get(&admin(), &id16(5)).await.is_ok());
}

#[tokio::test]
async fn test_update_keeps_input_timestamp() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let before = state.residents.get(&admin(), &id16(2)).await.unwrap();
    let mut edit = form(&id16(2), &id16(100), "SITI AMINAH", "Istri", "SATU");
    edit.pekerjaan = "guru".to_string();
    state
        .residents
        .update(&kadus(Hamlet::Satu), &id16(2), &edit)
        .await
        .unwrap();

    let after = state.residents.get(&admin(), &id16(2)).await.unwrap();
    assert_eq!(after.pekerjaan, "Guru");
    assert_eq!(after.tanggal_input, before.tanggal_input);
}

#[tokio::test]
async fn test_update_to_a_taken_nik_conflicts() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let edit = form(&id16(1), &id16(100), "SITI AMINAH", "Istri", "SATU");
    match state.residents.update(&admin(), &id16(2), &edit).await {
        Err(ServiceError::Conflict(msg)) => assert_eq!(msg, MSG_NIK_TAKEN),
        other => panic!("expected conflict, got {:?}", other),
    }

    let siti = state.residents.get(&admin(), &id16(2)).await.unwrap();
    assert_eq!(siti.nama, "SITI AMINAH");
    let budi = state.residents.get(&admin(), &id16(1)).await.unwrap();
    assert_eq!(budi.nama, "BUDI SANTOSO");
}

#[tokio::test]
async fn test_resident_cannot_change_own_nik() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let edit = form(&id16(77), &id16(300), "ANI LESTARI", "Kepala Keluarga", "DUA");
    match state.residents.update(&warga(&id16(4)), &id16(4), &edit).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {:?}", other),
    }

    let edit = form(&id16(4), &id16(300), "ANI LESTARI", "Kepala Keluarga", "DUA");
    assert!(state
        .residents
        .update(&warga(&id16(4)), &id16(4), &edit)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_delete_and_restore_round() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    match state.residents.delete(&admin(), &id16(3), "  ").await {
        Err(ServiceError::BadRequest(_)) => {}
        other => panic!("expected bad request, got {:?}", other),
    }
    match state.residents.delete(&kadus(Hamlet::Dua), &id16(3), "Pindah").await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {:?}", other),
    }

    let msg = state
        .residents
        .delete(&kadus(Hamlet::Satu), &id16(3), "Pindah")
        .await
        .unwrap();
    assert_eq!(msg, format!("Data NIK {} berhasil dihapus!", id16(3)));
    assert!(matches!(
        state.residents.get(&admin(), &id16(3)).await,
        Err(ServiceError::NotFound(_))
    ));

    let history = state.residents.deletion_history(&admin()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].nik, id16(3));
    assert_eq!(history[0].alasan_hapus, "Pindah");

    assert!(matches!(
        state.residents.restore(&kadus(Hamlet::Satu), &id16(3)).await,
        Err(ServiceError::Forbidden(_))
    ));

    state.residents.restore(&admin(), &id16(3)).await.unwrap();
    let back = state.residents.get(&admin(), &id16(3)).await.unwrap();
    assert_eq!(back.nama, "JOKO WIDODO");

    assert!(state.residents.deletion_history(&admin()).await.unwrap().is_empty());

    match state.residents.restore(&admin(), &id16(3)).await {
        Err(ServiceError::NotFound(msg)) => {
            assert_eq!(msg, format!("Data dengan NIK {} tidak ditemukan di log.", id16(3)))
        }
        other => panic!("expected not-in-log, got {:?}", other),
    }
    assert!(matches!(
        state.residents.restore(&admin(), &id16(9)).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        state.residents.restore(&admin(), "12ab").await,
        Err(ServiceError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_restore_clears_every_snapshot_of_the_nik() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    state.residents.delete(&admin(), &id16(4), "Pindah").await.unwrap();
    let again = form(&id16(4), &id16(300), "ANI LESTARI PUTRI", "Kepala Keluarga", "DUA");
    state.residents.create(&admin(), &again).await.unwrap();

    // logged and live at once
    assert!(matches!(
        state.residents.restore(&admin(), &id16(4)).await,
        Err(ServiceError::Conflict(_))
    ));

    state.residents.delete(&admin(), &id16(4), "Meninggal").await.unwrap();
    let history = state.residents.deletion_history(&admin()).await.unwrap();
    assert_eq!(history.iter().filter(|e| e.nik == id16(4)).count(), 2);

    state.residents.restore(&admin(), &id16(4)).await.unwrap();
    let back = state.residents.get(&admin(), &id16(4)).await.unwrap();
    assert_eq!(back.nama, "ANI LESTARI PUTRI");
    assert!(state.residents.deletion_history(&admin()).await.unwrap().is_empty());

    state.residents.delete(&admin(), &id16(4), "Pindah").await.unwrap();
    let history = state.residents.deletion_history(&admin()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].nama, "ANI LESTARI PUTRI");
}

#[tokio::test]
async fn test_household_of_respects_scope() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let kk = state
        .residents
        .household_of(&kadus(Hamlet::Satu), &id16(2))
        .await
        .unwrap();
    assert_eq!(kk, id16(100));

    assert!(matches!(
        state.residents.household_of(&kadus(Hamlet::Satu), &id16(4)).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        state.residents.household_of(&admin(), "").await,
        Err(ServiceError::BadRequest(_))
    ));
}
