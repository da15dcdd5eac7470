mod property_model;
