//! Built-in orders of worship per service type
//!
//! A date's first pastor save starts from one of these when no text has been
//! typed yet. Custom services carry their own template text in the database.

use super::document::ServiceType;

const NO_COMMUNION: &str = "\
Prelude
Welcome & Announcements
Opening Hymn:
Confession and Forgiveness
Kyrie
Prayer of the Day
First Reading:
Psalm:
Second Reading:
Gospel Acclamation: Alleluia
Gospel:
Children's Message
Sermon:
Hymn of the Day:
Apostles' Creed
Prayers of Intercession
Offering
Lord's Prayer
Blessing
Sending Song:
Dismissal
Postlude";

const COMMUNION: &str = "\
Prelude
Welcome & Announcements
Opening Hymn:
Confession and Forgiveness
Kyrie
This Is the Feast
Prayer of the Day
First Reading:
Psalm:
Second Reading:
Gospel Acclamation: Alleluia
Gospel:
Children's Message
Sermon:
Hymn of the Day:
Nicene Creed
Prayers of Intercession
Sharing of the Peace
Offering
Great Thanksgiving
Words of Institution
Lord's Prayer
Lamb of God
Communion Hymn:
Post-Communion Prayer
Blessing
Sending Song:
Dismissal
Postlude";

const COMMUNION_POTLUCK: &str = "\
Prelude
Welcome & Announcements
Potluck Fellowship Meal Invitation
Opening Hymn:
Confession and Forgiveness
Kyrie
This Is the Feast
Prayer of the Day
First Reading:
Psalm:
Second Reading:
Gospel Acclamation: Alleluia
Gospel:
Children's Message
Sermon:
Hymn of the Day:
Nicene Creed
Prayers of Intercession
Sharing of the Peace
Offering
Great Thanksgiving
Words of Institution
Lord's Prayer
Lamb of God
Communion Hymn:
Post-Communion Prayer
Table Blessing
Blessing
Sending Song:
Dismissal
Postlude";

/// Built-in template text; `None` for unset and custom service types
pub fn template_for(service_type: &ServiceType) -> Option<&'static str> {
    match service_type {
        ServiceType::NoCommunion => Some(NO_COMMUNION),
        ServiceType::Communion => Some(COMMUNION),
        ServiceType::CommunionPotluck => Some(COMMUNION_POTLUCK),
        ServiceType::Unset | ServiceType::Custom(_) => None,
    }
}

/// Service types that ship a built-in template
pub fn builtin_types() -> [ServiceType; 3] {
    [
        ServiceType::NoCommunion,
        ServiceType::Communion,
        ServiceType::CommunionPotluck,
    ]
}
