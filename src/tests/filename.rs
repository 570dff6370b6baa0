use crate::{
    filename::{date_from_name, is_coordinates, is_observation},
    navigation::find_navigation_file,
    prelude::*,
    tests::toolkit::test_resource,
};

#[test]
fn resource_names() {
    for (dir, observations, coordinates) in [("OBS/V2", 1, 0), ("OBS/V3", 1, 0), ("OBS/XYZ", 1, 1)] {
        let names = std::fs::read_dir(test_resource(dir))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names.iter().filter(|name| is_observation(name)).count(),
            observations,
            "{}",
            dir
        );
        assert_eq!(
            names.iter().filter(|name| is_coordinates(name)).count(),
            coordinates,
            "{}",
            dir
        );
    }
    assert_eq!(date_from_name("zimj1000.16o"), Date::new(2016, 4, 9));
    assert_eq!(
        date_from_name("BRDM00DLR_S_20161000000_01D_MN.rnx"),
        Date::new(2016, 4, 9)
    );
}

#[test]
fn navigation_lookup() {
    let date = Date::new(2016, 4, 9).unwrap();
    let v2 = [test_resource("NAV/V2")];

    let gps = find_navigation_file(&v2, date, Constellation::GPS, &[]).unwrap();
    assert_eq!(gps.file_name().unwrap(), "zimj1000.16n");
    let glo = find_navigation_file(&v2, date, Constellation::Glonass, &[]).unwrap();
    assert_eq!(glo.file_name().unwrap(), "zimj1000.16g");

    // no dedicated nor mixed file
    assert!(find_navigation_file(&v2, date, Constellation::Galileo, &[]).is_err());
    let other_day = Date::new(2016, 4, 10).unwrap();
    assert!(find_navigation_file(&v2, other_day, Constellation::GPS, &[]).is_err());

    // mixed files are the fallback
    let v3 = [test_resource("NAV/V3")];
    for constellation in [Constellation::GPS, Constellation::Glonass, Constellation::Galileo] {
        let found = find_navigation_file(&v3, date, constellation, &[]).unwrap();
        assert_eq!(
            found.file_name().unwrap(),
            "BRDM00DLR_S_20161000000_01D_MN.rnx"
        );
    }

    // dedicated files come first, whatever the priority
    let both = [test_resource("NAV/V3"), test_resource("NAV/V2")];
    let priority = ["brdm".to_string()];
    let gps = find_navigation_file(&both, date, Constellation::GPS, &priority).unwrap();
    assert_eq!(gps.file_name().unwrap(), "zimj1000.16n");
}
