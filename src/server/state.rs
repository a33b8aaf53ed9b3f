use crate::places::PlaceResolver;

pub struct AppState {
    pub resolver: PlaceResolver,
}
